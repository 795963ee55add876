//! Liveness support.
//!
//! The `/health` endpoint itself lives in `http::handlers`; this module
//! keeps the instance awake by requesting it periodically.
//!
//! ```text
//! timer (every keepalive.interval_secs)
//!     → GET http://127.0.0.1:<port>/health
//!     → outcome logged at debug, otherwise ignored
//! ```

pub mod keepalive;

pub use keepalive::KeepAlive;
