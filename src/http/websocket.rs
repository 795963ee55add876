//! WebSocket proxy handling.
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Proxy ←──── WebSocket frames ────→ Backend
//! ```
//!
//! The backend handshake happens before the client is answered: if the
//! backend is down or slow the client never gets a `101`, only an empty
//! `502` with `Connection: close`. Once both sides are open, frames are
//! copied as-is in both directions and the first side to finish closes
//! the other.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        FromRequestParts,
    },
    http::{header, request::Parts, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request as UpstreamRequest,
        protocol::{frame::coding::CloseCode, CloseFrame as UpstreamCloseFrame},
        Message as UpstreamMessage,
    },
    MaybeTlsStream, WebSocketStream,
};

use crate::error::ForwardingFailure;
use crate::http::forward::path_and_query;
use crate::http::headers::{apply_forwarded, strip_hop_by_hop, ClientInfo};
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::lifecycle::drain::SessionGuard;
use crate::observability::metrics;

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Headers the upstream handshake generates itself.
const HANDSHAKE_HEADERS: [header::HeaderName; 5] = [
    header::HOST,
    header::SEC_WEBSOCKET_KEY,
    header::SEC_WEBSOCKET_VERSION,
    header::SEC_WEBSOCKET_EXTENSIONS,
    header::SEC_WEBSOCKET_ACCEPT,
];

/// Forward a WebSocket upgrade to the target and relay frames.
pub async fn forward_upgrade(state: AppState, peer: SocketAddr, request: Request<Body>) -> Response {
    let path = path_and_query(&request);
    let (mut parts, _body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();

    let upgrade: WebSocketUpgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %rejection, "Invalid WebSocket upgrade");
            return rejection.into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        path = %path,
        client = %peer,
        target = %state.config.target.ws_url(parts.uri.path_and_query()),
        "WebSocket upgrade requested"
    );

    let (upstream, protocol) = match connect_upstream(&state, &parts, peer).await {
        Ok(connected) => connected,
        Err(err) => {
            // No handshake has been sent, so nothing but the status line goes out.
            tracing::error!(
                request_id = %request_id,
                path = %path,
                kind = err.kind(),
                error = %err,
                "WebSocket forwarding failed, closing client connection"
            );
            metrics::record_forward_failure(err.kind());
            return err.into_refused_upgrade();
        }
    };

    let upgrade = match protocol {
        Some(protocol) => upgrade.protocols([protocol]),
        None => upgrade,
    };

    let session = state.sessions.track();
    tracing::info!(session = %session.id(), path = %path, "WebSocket connection established");

    upgrade
        .on_failed_upgrade(|err: axum::Error| {
            tracing::warn!(error = %err, "Client WebSocket upgrade failed")
        })
        .on_upgrade(move |socket| relay(socket, upstream, session))
}

/// Open the backend socket. Returns it with the subprotocol the backend chose.
async fn connect_upstream(
    state: &AppState,
    parts: &Parts,
    peer: SocketAddr,
) -> Result<(UpstreamSocket, Option<String>), ForwardingFailure> {
    let client = ClientInfo::new(peer.ip(), &parts.headers);
    let request = upstream_request(
        state.config.target.ws_url(parts.uri.path_and_query()),
        &parts.headers,
        &client,
        &state.config.forwarding.forwarded_proto,
    )?;

    let timeout = state.request_timeout();
    let (socket, response) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request))
        .await
        .map_err(|_| ForwardingFailure::Timeout(timeout))??;

    let protocol = response
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    Ok((socket, protocol))
}

/// Build the backend handshake request carrying the client's headers.
fn upstream_request(
    url: String,
    inbound: &HeaderMap,
    client: &ClientInfo,
    forwarded_proto: &str,
) -> Result<UpstreamRequest, ForwardingFailure> {
    let mut forwarded = inbound.clone();
    strip_hop_by_hop(&mut forwarded);
    for name in &HANDSHAKE_HEADERS {
        forwarded.remove(name);
    }
    apply_forwarded(&mut forwarded, client, forwarded_proto);

    let mut request = url.into_client_request()?;
    let headers = request.headers_mut();
    for (name, value) in forwarded.iter() {
        headers.append(name.clone(), value.clone());
    }

    Ok(request)
}

/// Copy frames both ways until one side ends, then close the other.
async fn relay(client: WebSocket, upstream: UpstreamSocket, session: SessionGuard) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();
    let id = session.id();

    let client_to_upstream = async {
        while let Some(message) = client_rx.next().await {
            let message = match message {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(session = %id, error = %err, "Client WebSocket error");
                    break;
                }
            };
            let Some(message) = into_upstream(message) else {
                continue;
            };
            let closing = matches!(message, UpstreamMessage::Close(_));
            if let Err(err) = upstream_tx.send(message).await {
                tracing::warn!(session = %id, error = %err, "Failed to send to backend");
                break;
            }
            if closing {
                break;
            }
        }
    };

    let upstream_to_client = async {
        while let Some(message) = upstream_rx.next().await {
            let message = match message {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(session = %id, error = %err, "Backend WebSocket error");
                    break;
                }
            };
            let Some(message) = into_client(message) else {
                continue;
            };
            let closing = matches!(message, Message::Close(_));
            if let Err(err) = client_tx.send(message).await {
                tracing::warn!(session = %id, error = %err, "Failed to send to client");
                break;
            }
            if closing {
                break;
            }
        }
    };

    let ended_by = tokio::select! {
        _ = client_to_upstream => "client",
        _ = upstream_to_client => "backend",
    };

    let _ = upstream_tx.close().await;
    let _ = client_tx.close().await;

    tracing::info!(session = %id, ended_by, "WebSocket connection closed");
}

// Each hop's socket answers Pings itself. Pings still cross, but the Pong
// coming back has been answered already and is dropped.
fn into_upstream(message: Message) -> Option<UpstreamMessage> {
    let message = match message {
        Message::Text(text) => UpstreamMessage::Text(text.as_str().into()),
        Message::Binary(data) => UpstreamMessage::Binary(data),
        Message::Ping(data) => UpstreamMessage::Ping(data),
        Message::Pong(_) => return None,
        Message::Close(frame) => UpstreamMessage::Close(frame.map(|frame| UpstreamCloseFrame {
            code: CloseCode::from(frame.code),
            reason: frame.reason.as_str().into(),
        })),
    };
    Some(message)
}

fn into_client(message: UpstreamMessage) -> Option<Message> {
    let message = match message {
        UpstreamMessage::Text(text) => Message::Text(text.as_str().into()),
        UpstreamMessage::Binary(data) => Message::Binary(data),
        UpstreamMessage::Ping(data) => Message::Ping(data),
        UpstreamMessage::Pong(_) => return None,
        UpstreamMessage::Close(frame) => Message::Close(frame.map(|frame| CloseFrame {
            code: u16::from(frame.code),
            reason: frame.reason.as_str().into(),
        })),
        // Raw frames are never yielded when reading.
        UpstreamMessage::Frame(_) => return None,
    };
    Some(message)
}
