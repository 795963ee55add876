//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with local endpoints and the catch-all forwarder
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Own the pooled upstream HTTP client
//! - Start the self-ping task
//! - Serve until shutdown, then drain live WebSocket sessions

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    routing::{any, get},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::health::keepalive::KeepAlive;
use crate::http::forward::proxy_handler;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::panic_response;
use crate::lifecycle::drain::SessionTracker;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub client: Client<HttpConnector, Body>,
    pub sessions: SessionTracker,
}

impl AppState {
    /// Bound on how long the backend has to answer.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeouts.request_secs)
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
    sessions: SessionTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let config = Arc::new(config);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let sessions = SessionTracker::new();
        let state = AppState {
            config: config.clone(),
            client,
            sessions: sessions.clone(),
        };

        Self {
            router: Self::build_router(state),
            config,
            sessions,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health).fallback(proxy_handler))
            .route("/", get(handlers::info).fallback(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .fallback(handlers::fallback)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// After the signal no new connections are accepted; in-flight HTTP
    /// requests finish and live WebSocket sessions are waited for (up to
    /// `timeouts.drain_secs`, or indefinitely when 0).
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            target = %self.config.target.base_url(),
            "HTTP server starting"
        );

        if self.config.keepalive.enabled {
            match KeepAlive::new(addr, &self.config.keepalive) {
                Ok(keepalive) => {
                    tokio::spawn(keepalive.run(shutdown.resubscribe()));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to configure keep-alive ping");
                }
            }
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, no longer accepting connections");
            })
            .await?;

        let deadline = match self.config.timeouts.drain_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        if self.sessions.active_count() > 0 {
            tracing::info!(
                sessions = self.sessions.active_count(),
                "Waiting for WebSocket sessions to close"
            );
        }
        if !self.sessions.wait_for_drain(deadline).await {
            tracing::warn!(
                sessions = self.sessions.active_count(),
                "Drain deadline reached, abandoning WebSocket sessions"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
