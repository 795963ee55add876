//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional TOML file (loader.rs)
//!     → PORT / TARGET_HOST / TARGET_PORT overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable for the process lifetime)
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ForwardingConfig, KeepAliveConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyConfig, ServiceConfig, TargetConfig, TimeoutConfig,
};
pub use validation::ValidationError;
