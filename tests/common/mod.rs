//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        FromRequestParts,
    },
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use metals_ws_proxy::{HttpServer, ProxyConfig, Shutdown};

/// A proxy running on an ephemeral port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

/// Config pointing at `target` with the self-ping disabled.
pub fn proxy_config(target: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.target.host = target.ip().to_string();
    config.target.port = target.port();
    config.keepalive.enabled = false;
    config
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    RunningProxy { addr, shutdown, handle }
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a mock quote backend.
///
/// - WebSocket upgrades on any path echo text and binary frames; `/close-me`
///   closes immediately with code 4000 "done". Offers subprotocol `quotes.v1`.
/// - `/status/{code}` answers with that status and body `status {code}`.
/// - Anything else echoes the request as JSON.
pub async fn start_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

async fn echo(request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();

    if parts.headers.contains_key(header::UPGRADE) {
        let path = parts.uri.path().to_string();
        let upgrade: WebSocketUpgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(upgrade) => upgrade,
            Err(rejection) => return rejection.into_response(),
        };
        return upgrade
            .protocols(["quotes.v1"])
            .on_upgrade(move |socket| ws_backend(socket, path));
    }

    if let Some(code) = parts.uri.path().strip_prefix("/status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::BAD_REQUEST);
        return (status, format!("status {}", code)).into_response();
    }

    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let headers: Map<String, Value> = parts
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v.to_str().unwrap_or_default())))
        .collect();

    Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "body": String::from_utf8_lossy(&body),
        "headers": headers,
    }))
    .into_response()
}

async fn ws_backend(mut socket: WebSocket, path: String) {
    if path == "/close-me" {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: 4000,
                reason: "done".into(),
            })))
            .await;
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(_) | Message::Binary(_) => {
                if socket.send(message).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

/// Start a WebSocket backend that reports every frame it receives and
/// echoes text frames.
pub async fn start_recording_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Message>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();

    let app = Router::new().fallback(move |upgrade: WebSocketUpgrade| {
        let frames_tx = frames_tx.clone();
        async move { upgrade.on_upgrade(move |socket| record_frames(socket, frames_tx)) }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, frames_rx)
}

async fn record_frames(mut socket: WebSocket, frames: mpsc::UnboundedSender<Message>) {
    while let Some(Ok(message)) = socket.recv().await {
        let _ = frames.send(message.clone());
        match message {
            Message::Text(_) => {
                if socket.send(message).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

/// Start a raw backend that waits `delay` before answering `200 slow`.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        tokio::time::sleep(delay).await;
                        let body = "slow";
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
