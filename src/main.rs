//! Precious metals quote WebSocket proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   client (via platform edge)
//!       │
//!       ▼
//!   http::server ──▶ GET /, GET /health ──▶ local JSON
//!       │
//!       ▼ everything else
//!   http::forward ──▶ hyper client ──────────▶ target (HTTP)
//!       │
//!       ▼ Upgrade: websocket
//!   http::websocket ──▶ tungstenite relay ───▶ target (WS)
//!
//!   cross-cutting: config, lifecycle, health::keepalive, observability
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use metals_ws_proxy::config::load_config;
use metals_ws_proxy::observability::{logging, metrics};
use metals_ws_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "metals-ws-proxy", version)]
#[command(about = "Forwards HTTP and WebSocket traffic to the quote backend", long_about = None)]
struct Cli {
    /// Optional TOML configuration file. PORT, TARGET_HOST and TARGET_PORT override it.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!("metals-ws-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        target_url = %config.target.base_url(),
        port = config.listener.port,
        request_timeout_secs = config.timeouts.request_secs,
        keepalive = config.keepalive.enabled,
        keepalive_interval_secs = config.keepalive.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Some(addr) = config.observability.metrics_socket_addr() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    tracing::info!(
        "WebSocket: wss://{}/your-uid  HTTP: https://{}/api/...  Health: https://{}/health",
        config.service.public_host,
        config.service.public_host,
        config.service.public_host,
    );

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
