//! Forwarding failures.
//!
//! Every way a forward can go wrong collapses into [`ForwardingFailure`].
//! Nothing is retried: HTTP callers get one 500 JSON body, WebSocket
//! callers get a refused handshake.

use std::time::Duration;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::http::response::ErrorBody;

#[derive(Debug, Error)]
pub enum ForwardingFailure {
    /// The upstream request could not be built from the inbound one.
    #[error("invalid upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    /// Connection refused, reset, or protocol error talking to the backend.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The backend did not answer within the request timeout.
    #[error("upstream did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// The backend refused or broke the WebSocket handshake.
    #[error("upstream websocket handshake failed: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

impl ForwardingFailure {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardingFailure::InvalidRequest(_) => "invalid_request",
            ForwardingFailure::Upstream(_) => "upstream",
            ForwardingFailure::Timeout(_) => "timeout",
            ForwardingFailure::WebSocket(_) => "websocket",
        }
    }

    /// Response for a failed WebSocket upgrade: no handshake, no body,
    /// connection closed.
    pub fn into_refused_upgrade(self) -> Response {
        (StatusCode::BAD_GATEWAY, [(header::CONNECTION, "close")]).into_response()
    }
}

impl IntoResponse for ForwardingFailure {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("proxy error", self.to_string())),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn http_failure_is_500_json_with_timestamp() {
        let response = ForwardingFailure::Timeout(Duration::from_secs(60)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "proxy error");
        assert_eq!(body["message"], "upstream did not respond within 60s");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn refused_upgrade_has_no_body() {
        let response = ForwardingFailure::Timeout(Duration::from_secs(1)).into_refused_upgrade();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::CONNECTION], "close");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ForwardingFailure::Timeout(Duration::ZERO).kind(), "timeout");
        assert_eq!(
            ForwardingFailure::WebSocket(tungstenite::Error::ConnectionClosed).kind(),
            "websocket"
        );
    }
}
