//! Endpoints served by the proxy itself.
//!
//! `GET /health` and `GET /` answer locally. A WebSocket upgrade on either
//! path is still forwarded, as is any other method.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::forward::proxy_handler;
use crate::http::headers::is_websocket_upgrade;
use crate::http::response::{not_found, timestamp, Endpoints, HealthBody, InfoBody, Usage};
use crate::http::server::AppState;

/// `GET /health`: always 200 while the process is up, whatever the target's state.
pub async fn health(
    State(state): State<AppState>,
    connect_info: ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    if is_websocket_upgrade(request.headers()) {
        return proxy_handler(State(state), connect_info, request).await;
    }

    Json(HealthBody {
        status: "ok",
        service: state.config.service.name.clone(),
        target: state.config.target.base_url(),
        timestamp: timestamp(),
    })
    .into_response()
}

/// `GET /`: service description and usage hints.
pub async fn info(
    State(state): State<AppState>,
    connect_info: ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    if is_websocket_upgrade(request.headers()) {
        return proxy_handler(State(state), connect_info, request).await;
    }

    let service = &state.config.service;
    Json(InfoBody {
        service: service.name.clone(),
        description: service.description.clone(),
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        target: state.config.target.base_url(),
        endpoints: Endpoints {
            health: "/health",
            proxy: "/* (forwards all requests)",
        },
        usage: Usage {
            websocket: format!("wss://{}/your-uid", service.public_host),
            http: format!("https://{}/api/...", service.public_host),
        },
    })
    .into_response()
}

/// Router fallback.
pub async fn fallback(uri: Uri) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.to_string());
    tracing::warn!(path = %path, "No handler for path");
    not_found(path)
}
