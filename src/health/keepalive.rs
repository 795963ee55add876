//! Periodic self-ping.
//!
//! The hosting platform idles instances that see no traffic, so the proxy
//! requests its own health endpoint on a timer. The outcome is only logged.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, uri::Scheme, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::config::KeepAliveConfig;

pub struct KeepAlive {
    uri: Uri,
    interval: Duration,
    timeout: Duration,
    client: Client<HttpConnector, Body>,
}

impl KeepAlive {
    /// Build a pinger for the listener bound at `listen_addr`.
    pub fn new(listen_addr: SocketAddr, config: &KeepAliveConfig) -> Result<Self, axum::http::Error> {
        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(loopback_addr(listen_addr).to_string().as_str())
            .path_and_query(config.path.as_str())
            .build()?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            uri,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
            client,
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Ping every interval until shutdown. The first ping happens one
    /// interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            uri = %self.uri,
            "Keep-alive ping starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.ping().await;
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Keep-alive ping stopping");
                    break;
                }
            }
        }
    }

    /// One ping. Returns whether the endpoint answered with a success status.
    pub async fn ping(&self) -> bool {
        let request = match Request::builder()
            .method("GET")
            .uri(self.uri.clone())
            .header(header::USER_AGENT, "metals-ws-proxy-keepalive")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to build keep-alive request");
                return false;
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                tracing::debug!(status = %response.status(), "Keep-alive ping answered");
                response.status().is_success()
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Keep-alive ping failed");
                false
            }
            Err(_) => {
                tracing::debug!("Keep-alive ping timed out");
                false
            }
        }
    }
}

/// Address to reach a listener from the same host: wildcard binds become loopback.
pub fn loopback_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}
