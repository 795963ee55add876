//! Request identification.
//!
//! Every inbound request gets an `x-request-id` (UUID v4) unless the client
//! already sent one. The id stays on the request headers, so it is
//! forwarded to the backend, and is copied onto the response.

use axum::http::{HeaderMap, HeaderName};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer assigning a request id to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid)
}

/// Layer copying the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID.clone())
}

/// Request id for logging, or `"unknown"` if the layer did not run.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
