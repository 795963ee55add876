//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, panic recovery)
//!     → handlers.rs (GET /health, GET /)
//!     → forward.rs (everything else)
//!         → websocket.rs (upgrade requests)
//!         → headers.rs (hop-by-hop, X-Forwarded-*)
//!     → response.rs (JSON bodies for local answers and failures)
//! ```

pub mod forward;
pub mod handlers;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
