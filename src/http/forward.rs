//! Request forwarding to the target backend.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → WebSocket upgrade?  → websocket.rs
//!     → rewrite URI to target, strip hop-by-hop, set X-Forwarded-*
//!     → pooled hyper client (single attempt, request timeout)
//!     → stream backend response back unchanged
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Method, Request, Version},
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;

use crate::error::ForwardingFailure;
use crate::http::headers::{apply_forwarded, is_websocket_upgrade, strip_hop_by_hop, ClientInfo};
use crate::http::request::request_id;
use crate::http::response::not_found;
use crate::http::server::AppState;
use crate::http::websocket;
use crate::observability::metrics;

/// Catch-all handler: forwards everything that is not served locally.
pub async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    if request.method() == Method::CONNECT {
        tracing::warn!(uri = %request.uri(), "CONNECT is not proxied");
        return not_found(request.uri().to_string());
    }

    if is_websocket_upgrade(request.headers()) {
        return websocket::forward_upgrade(state, peer, request).await;
    }

    forward_http(state, peer, request).await
}

async fn forward_http(state: AppState, peer: SocketAddr, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = path_and_query(&request);
    let request_id = request_id(request.headers()).to_string();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        client = %peer,
        "Proxying request"
    );

    match send_upstream(&state, peer, request).await {
        Ok(response) => {
            let status = response.status();
            tracing::info!(
                request_id = %request_id,
                status = status.as_u16(),
                path = %path,
                "Upstream responded"
            );
            metrics::record_request(method.as_str(), status.as_u16(), start_time);
            response
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                kind = err.kind(),
                error = %err,
                "Forwarding failed"
            );
            metrics::record_forward_failure(err.kind());
            metrics::record_request(method.as_str(), 500, start_time);
            err.into_response()
        }
    }
}

async fn send_upstream(
    state: &AppState,
    peer: SocketAddr,
    request: Request<Body>,
) -> Result<Response, ForwardingFailure> {
    let client = ClientInfo::new(peer.ip(), request.headers());
    let (mut parts, body) = request.into_parts();

    parts.uri = state.config.target.http_uri(parts.uri.path_and_query())?;
    // The pooled client speaks HTTP/1.1 to the backend whatever the client used.
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);
    parts.headers.remove(header::HOST);
    apply_forwarded(
        &mut parts.headers,
        &client,
        &state.config.forwarding.forwarded_proto,
    );

    let timeout = state.request_timeout();
    let response: Response<Incoming> = tokio::time::timeout(
        timeout,
        state.client.request(Request::from_parts(parts, body)),
    )
    .await
    .map_err(|_| ForwardingFailure::Timeout(timeout))??;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(body)))
}

pub(crate) fn path_and_query<B>(request: &Request<B>) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}
