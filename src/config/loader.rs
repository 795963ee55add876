//! Configuration loading: defaults, optional TOML file, then environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listen port override.
pub const ENV_PORT: &str = "PORT";
/// Backend host override.
pub const ENV_TARGET_HOST: &str = "TARGET_HOST";
/// Backend port override.
pub const ENV_TARGET_PORT: &str = "TARGET_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable {var}=`{value}` is not a valid port")]
    InvalidEnv { var: &'static str, value: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional file and the process environment,
/// then validate it.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `PORT`, `TARGET_HOST` and `TARGET_PORT` on top of `config`.
///
/// Empty values are ignored so an unset-but-declared variable on the
/// hosting platform does not clobber the file or default.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(value) = get(ENV_PORT) {
        config.listener.port = parse_port(ENV_PORT, value)?;
    }
    if let Some(value) = get(ENV_TARGET_HOST) {
        config.target.host = value;
    }
    if let Some(value) = get(ENV_TARGET_PORT) {
        config.target.port = parse_port(ENV_TARGET_PORT, value)?;
    }

    Ok(())
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
