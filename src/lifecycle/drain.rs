//! Live WebSocket session tracking for graceful shutdown.
//!
//! Axum's graceful shutdown waits for HTTP connections, but an upgraded
//! connection leaves hyper's bookkeeping once the `101` is sent. Each relay
//! holds a [`SessionGuard`] so shutdown can wait for the sockets too.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::observability::metrics;

/// Global atomic counter for session IDs.
/// Relaxed ordering is enough since we only need uniqueness.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a relayed WebSocket session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ws-{}", self.0)
    }
}

/// Counts live sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active_count: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live session. The returned guard decrements on drop.
    pub fn track(&self) -> SessionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::websocket_opened();
        SessionGuard {
            active_count: Arc::clone(&self.active_count),
            id: SessionId::next(),
        }
    }

    /// Current number of live sessions.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every session has closed.
    ///
    /// Returns `false` if `deadline` elapsed first. `None` waits forever.
    pub async fn wait_for_drain(&self, deadline: Option<Duration>) -> bool {
        let started = Instant::now();
        while self.active_count() > 0 {
            if deadline.is_some_and(|limit| started.elapsed() >= limit) {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        true
    }
}

/// Held by a relay for the lifetime of its socket pair.
#[derive(Debug)]
pub struct SessionGuard {
    active_count: Arc<AtomicU64>,
    id: SessionId,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::websocket_closed();
        tracing::debug!(session = %self.id, "Session released");
    }
}
