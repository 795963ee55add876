//! Graceful shutdown: stop accepting, let in-flight work finish.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

mod common;

#[tokio::test]
async fn in_flight_request_completes_after_shutdown() {
    let backend = common::start_slow_backend(Duration::from_millis(800)).await;
    let proxy = common::start_proxy(common::proxy_config(backend)).await;

    let url = proxy.url("/api/slow");
    let in_flight = tokio::spawn(async move { common::http_client().get(url).send().await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    proxy.shutdown.trigger();

    let res = in_flight.await.unwrap().expect("in-flight request was dropped");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "slow");

    let finished = tokio::time::timeout(Duration::from_secs(5), proxy.handle)
        .await
        .expect("server did not stop");
    assert!(finished.unwrap().is_ok());

    assert!(
        tokio::net::TcpStream::connect(proxy.addr).await.is_err(),
        "no new connections after shutdown"
    );
}

#[tokio::test]
async fn live_websocket_holds_shutdown_until_closed() {
    let backend = common::start_backend().await;
    let proxy = common::start_proxy(common::proxy_config(backend)).await;

    let (mut ws, _) = connect_async(proxy.ws_url("/abc123")).await.expect("handshake failed");
    ws.send(Message::text("before")).await.unwrap();
    assert_eq!(ws.next().await.unwrap().unwrap(), Message::text("before"));

    proxy.shutdown.trigger();
    let mut handle = proxy.handle;

    assert!(
        tokio::time::timeout(Duration::from_millis(500), &mut handle).await.is_err(),
        "server exited while a session was live"
    );

    // The session keeps working while draining.
    ws.send(Message::text("during")).await.unwrap();
    assert_eq!(ws.next().await.unwrap().unwrap(), Message::text("during"));

    ws.close(None).await.unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop after the session closed");
    assert!(finished.unwrap().is_ok());
}

#[tokio::test]
async fn drain_deadline_bounds_shutdown() {
    let backend = common::start_backend().await;
    let mut config = common::proxy_config(backend);
    config.timeouts.drain_secs = 1;
    let proxy = common::start_proxy(config).await;

    let (_ws, _) = connect_async(proxy.ws_url("/abc123")).await.expect("handshake failed");

    proxy.shutdown.trigger();

    let finished = tokio::time::timeout(Duration::from_secs(5), proxy.handle)
        .await
        .expect("drain deadline ignored");
    assert!(finished.unwrap().is_ok());
}
