//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::net::SocketAddr;

use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// The single backend every request is forwarded to.
    pub target: TargetConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Forwarded-header settings.
    pub forwarding: ForwardingConfig,

    /// Self-ping settings.
    pub keepalive: KeepAliveConfig,

    /// Service identity reported by `/` and `/health`.
    pub service: ServiceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port. Overridden by `PORT`.
    pub port: u16,
}

impl ListenerConfig {
    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// The backend all traffic is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Backend host or IP. Overridden by `TARGET_HOST`.
    pub host: String,

    /// Backend port. Overridden by `TARGET_PORT`.
    pub port: u16,

    /// Backend scheme. Only plain `http` is supported.
    pub scheme: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "120.25.236.183".to_string(),
            port: 8189,
            scheme: "http".to_string(),
        }
    }
}

impl TargetConfig {
    /// `host:port`, also used as the forwarded `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL reported to clients, e.g. `http://120.25.236.183:8189`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.authority())
    }

    /// Absolute backend URI for an inbound request's path and query.
    pub fn http_uri(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, axum::http::Error> {
        let authority = Authority::try_from(self.authority().as_str())?;
        let path = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(authority)
            .path_and_query(path)
            .build()
    }

    /// WebSocket URL for an inbound upgrade's path and query.
    pub fn ws_url(&self, path_and_query: Option<&PathAndQuery>) -> String {
        let path = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
        let scheme = if self.scheme == "https" { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.authority(), path)
    }
}

/// Timeout configuration for upstream operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP connect timeout towards the backend, in seconds.
    pub connect_secs: u64,

    /// Time the backend has to answer (response head or WebSocket handshake), in seconds.
    pub request_secs: u64,

    /// How long shutdown waits for live WebSocket sessions. 0 waits indefinitely.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
            drain_secs: 0,
        }
    }
}

/// Forwarded-header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Value written to `X-Forwarded-Proto`. The platform edge terminates TLS.
    pub forwarded_proto: String,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            forwarded_proto: "https".to_string(),
        }
    }
}

/// Self-ping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Enable the periodic self-ping.
    pub enabled: bool,

    /// Interval between pings in seconds.
    pub interval_secs: u64,

    /// Per-ping timeout in seconds.
    pub timeout_secs: u64,

    /// Local path to request.
    pub path: String,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5 * 60,
            timeout_secs: 10,
            path: "/health".to_string(),
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Short service name reported by `/health`.
    pub name: String,

    /// Human readable description reported by `/`.
    pub description: String,

    /// Public hostname clients use, shown in usage hints.
    pub public_host: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "metals-ws-proxy".to_string(),
            description: "Precious metals quote WebSocket proxy".to_string(),
            public_host: "your-app.onrender.com".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Default `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl ObservabilityConfig {
    pub fn metrics_socket_addr(&self) -> Option<SocketAddr> {
        self.metrics_address.parse().ok()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_filter: "metals_ws_proxy=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_matches_quote_backend() {
        let target = TargetConfig::default();
        assert_eq!(target.base_url(), "http://120.25.236.183:8189");
        assert_eq!(target.authority(), "120.25.236.183:8189");
    }

    #[test]
    fn http_uri_keeps_path_and_query() {
        let target = TargetConfig::default();
        let pq = PathAndQuery::from_static("/api/quotes?symbol=XAU&limit=5");
        let uri = target.http_uri(Some(&pq)).unwrap();
        assert_eq!(uri.to_string(), "http://120.25.236.183:8189/api/quotes?symbol=XAU&limit=5");
    }

    #[test]
    fn http_uri_defaults_to_root() {
        let target = TargetConfig::default();
        let uri = target.http_uri(None).unwrap();
        assert_eq!(uri.path(), "/");
    }

    #[test]
    fn ws_url_uses_ws_scheme() {
        let target = TargetConfig {
            host: "127.0.0.1".into(),
            port: 9001,
            scheme: "http".into(),
        };
        let pq = PathAndQuery::from_static("/abc123?token=x");
        assert_eq!(target.ws_url(Some(&pq)), "ws://127.0.0.1:9001/abc123?token=x");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [target]
            host = "10.0.0.5"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.target.host, "10.0.0.5");
        assert_eq!(config.target.port, 8189);
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.timeouts.request_secs, 60);
        assert_eq!(config.keepalive.interval_secs, 300);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
