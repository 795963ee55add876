//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every problem is
//! reported, not just the first.

use std::net::IpAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::{ProxyConfig, TargetConfig};

/// A single semantic problem in a [`ProxyConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host `{0}` is not an IP address")]
    InvalidListenHost(String),

    #[error("target.host must not be empty")]
    EmptyTargetHost,

    #[error("target.port must be non-zero")]
    ZeroTargetPort,

    #[error("target.scheme `{0}` is not supported (expected `http`)")]
    UnsupportedScheme(String),

    #[error("target.host `{0}` is not a valid host name or IP address")]
    InvalidTargetHost(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("keepalive.path `{0}` must start with `/`")]
    InvalidKeepAlivePath(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidListenHost(config.listener.host.clone()));
    }

    let target = &config.target;
    if target.host.trim().is_empty() {
        errors.push(ValidationError::EmptyTargetHost);
    } else if !is_valid_target_host(target) {
        errors.push(ValidationError::InvalidTargetHost(target.host.clone()));
    }
    if target.port == 0 {
        errors.push(ValidationError::ZeroTargetPort);
    }
    if target.scheme != "http" {
        errors.push(ValidationError::UnsupportedScheme(target.scheme.clone()));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }

    let keepalive = &config.keepalive;
    if keepalive.enabled {
        if keepalive.interval_secs == 0 {
            errors.push(ValidationError::ZeroDuration("keepalive.interval_secs"));
        }
        if keepalive.timeout_secs == 0 {
            errors.push(ValidationError::ZeroDuration("keepalive.timeout_secs"));
        }
        if !keepalive.path.starts_with('/') {
            errors.push(ValidationError::InvalidKeepAlivePath(keepalive.path.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_socket_addr().is_none() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The host must form a bare `host:port` authority, the same parse the
/// forwarder applies per request, and nothing else may ride along in it.
fn is_valid_target_host(target: &TargetConfig) -> bool {
    if Authority::try_from(target.authority().as_str()).is_err() {
        return false;
    }
    match url::Url::parse(&target.base_url()) {
        Ok(url) => {
            url.host_str().is_some_and(|host| host.eq_ignore_ascii_case(&target.host))
                && url.path() == "/"
        }
        Err(_) => false,
    }
}
