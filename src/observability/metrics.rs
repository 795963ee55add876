//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): forwarded HTTP requests by method, status
//! - `proxy_request_duration_seconds` (histogram): time to upstream response head
//! - `proxy_forward_failures_total` (counter): failures by kind
//! - `proxy_websocket_sessions` (gauge): live relayed sessions
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start_time: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

pub fn record_forward_failure(kind: &'static str) {
    counter!("proxy_forward_failures_total", "kind" => kind).increment(1);
}

pub fn websocket_opened() {
    gauge!("proxy_websocket_sessions").increment(1.0);
}

pub fn websocket_closed() {
    gauge!("proxy_websocket_sessions").decrement(1.0);
}
