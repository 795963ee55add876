//! Precious metals quote WebSocket proxy.
//!
//! Forwards every HTTP request and WebSocket upgrade to one fixed backend.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use error::ForwardingFailure;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
