//! Header rewriting for forwarded traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers (RFC 9110 §7.6.1) in both directions
//! - Overwrite X-Forwarded-For, X-Real-IP, X-Forwarded-Proto, X-Forwarded-Host
//! - Detect WebSocket upgrade requests
//!
//! Incoming X-Forwarded-* values are never trusted; the proxy always
//! writes what it observed itself.

use std::net::IpAddr;

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, HeaderValue,
};

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

static KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// What the proxy observed about the original client.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    /// TCP peer address of the inbound connection.
    pub ip: IpAddr,
    /// `Host` header the client sent, if any.
    pub host: Option<HeaderValue>,
}

impl ClientInfo {
    pub fn new(ip: IpAddr, headers: &HeaderMap) -> Self {
        Self {
            ip,
            host: headers.get(header::HOST).cloned(),
        }
    }
}

/// True when the request asks to switch to the WebSocket protocol.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let upgrade = headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));

    let connection = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    upgrade && connection
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }

    for name in [
        &header::CONNECTION,
        &KEEP_ALIVE,
        &header::PROXY_AUTHENTICATE,
        &header::PROXY_AUTHORIZATION,
        &header::TE,
        &header::TRAILER,
        &header::TRANSFER_ENCODING,
        &header::UPGRADE,
    ] {
        headers.remove(name);
    }
}

/// Overwrite the forwarded headers to describe `client`.
pub fn apply_forwarded(headers: &mut HeaderMap, client: &ClientInfo, proto: &str) {
    if let Ok(ip) = HeaderValue::from_str(&client.ip.to_string()) {
        headers.insert(X_FORWARDED_FOR.clone(), ip.clone());
        headers.insert(X_REAL_IP.clone(), ip);
    }

    match HeaderValue::from_str(proto) {
        Ok(value) => {
            headers.insert(X_FORWARDED_PROTO.clone(), value);
        }
        Err(_) => {
            headers.remove(&X_FORWARDED_PROTO);
        }
    }

    match &client.host {
        Some(host) => {
            headers.insert(X_FORWARDED_HOST.clone(), host.clone());
        }
        None => {
            headers.remove(&X_FORWARDED_HOST);
        }
    }
}
