//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (logging.rs installs the subscriber)
//!     → metrics facade calls (metrics.rs, exported only when enabled)
//! ```

pub mod logging;
pub mod metrics;
