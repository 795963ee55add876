//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → server stops accepting, self-ping stops
//!
//! Drain (drain.rs):
//!     in-flight HTTP finishes (axum) → live WebSocket sessions close → exit 0
//! ```

pub mod drain;
pub mod shutdown;
pub mod signals;

pub use drain::{SessionGuard, SessionId, SessionTracker};
pub use shutdown::Shutdown;
