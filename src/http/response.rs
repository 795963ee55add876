//! JSON bodies produced by the proxy itself.
//!
//! Everything the backend returns is streamed through untouched; only
//! local endpoints and failures use these shapes.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// RFC 3339 UTC timestamp with millisecond precision, e.g. `2026-10-18T09:30:00.123Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub service: String,
    pub target: String,
    pub timestamp: String,
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct InfoBody {
    pub service: String,
    pub description: String,
    pub version: &'static str,
    pub status: &'static str,
    pub target: String,
    pub endpoints: Endpoints,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub health: &'static str,
    pub proxy: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Usage {
    pub websocket: String,
    pub http: String,
}

/// Error body for failed forwards and panics.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub timestamp: String,
}

impl ErrorBody {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            timestamp: timestamp(),
        }
    }
}

/// Body for requests nothing handles.
#[derive(Debug, Serialize)]
pub struct NotFoundBody {
    pub error: &'static str,
    pub path: String,
    pub timestamp: String,
}

/// 404 with the requested path.
pub fn not_found(path: impl Into<String>) -> Response {
    let body = NotFoundBody {
        error: "not found",
        path: path.into(),
        timestamp: timestamp(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Converts a caught handler panic into the generic 500 body.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %message, "Unhandled error in request handler");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("server error", message)),
    )
        .into_response()
}
