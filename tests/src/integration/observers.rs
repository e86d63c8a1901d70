//! # Observer Channel Flows
//!
//! Same relay as [`super::flows`], but observed the way a dashboard sees it:
//! through a WebSocket connected to the hub path.
//!
//! 1. **Fan-out**: Notification POST → one `gridupdate` text frame per event, in order
//! 2. **Keep-alive**: client ping → pong with the same payload
//! 3. **Shutdown**: `RelayService::shutdown` → Close frame to every observer

use super::flows::RunningRelay;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type ObserverSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect to the hub path and wait until the relay has registered the
/// observer, so nothing broadcast afterwards can be missed.
pub async fn connect_observer(relay: &RunningRelay) -> ObserverSocket {
    let before = relay
        .service
        .metrics()
        .observers_connected
        .load(Ordering::Relaxed);
    let url = format!(
        "ws://{}{}",
        relay.addr,
        relay.service.config().routes.hub_path
    );
    let (socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("websocket handshake");

    wait_until(|| {
        relay
            .service
            .metrics()
            .observers_connected
            .load(Ordering::Relaxed)
            > before
    })
    .await;

    socket
}

/// Poll `condition` until it holds; the session updates counters after I/O.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition reached within 2s");
}

/// Next frame that is not a server keep-alive ping.
pub async fn next_frame(socket: &mut ObserverSocket) -> Message {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Ping(_))) => continue,
                Some(Ok(message)) => return message,
                Some(Err(e)) => panic!("websocket error: {e}"),
                None => panic!("websocket closed without a close frame"),
            }
        }
    })
    .await
    .expect("frame within 2s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_webhook::RelayConfig;
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    fn event(id: &str) -> Value {
        json!({
            "id": id,
            "eventType": "Microsoft.Storage.BlobCreated",
            "subject": format!("/blobServices/default/containers/c/blobs/{id}"),
            "eventTime": "2024-01-01T02:00:00.1234567+02:00",
            "data": { "api": "PutBlob" }
        })
    }

    async fn notify(relay: &RunningRelay, body: Value) -> StatusCode {
        reqwest::Client::new()
            .post(relay.url("/api/updates"))
            .header("aeg-event-type", "Notification")
            .json(&body)
            .send()
            .await
            .unwrap()
            .status()
    }

    fn invocation(message: Message) -> Value {
        match message {
            Message::Text(_) => serde_json::from_str(message.to_text().unwrap()).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_frames_arrive_in_batch_order() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let mut first = connect_observer(&relay).await;
        let mut second = connect_observer(&relay).await;

        let status = notify(&relay, json!([event("a"), event("b"), event("c")])).await;
        assert_eq!(status, StatusCode::OK);

        for socket in [&mut first, &mut second] {
            for id in ["a", "b", "c"] {
                let frame = invocation(next_frame(socket).await);
                assert_eq!(frame["type"], 1);
                assert_eq!(frame["target"], "gridupdate");

                let arguments = frame["arguments"].as_array().unwrap();
                assert_eq!(arguments.len(), 5);
                assert_eq!(arguments[0], id);
                assert_eq!(arguments[1], "Microsoft.Storage.BlobCreated");
                assert_eq!(arguments[3], "2024-01-01T02:00:00.1234567+02:00");

                let record: Value = serde_json::from_str(arguments[4].as_str().unwrap()).unwrap();
                assert_eq!(record["eventTime"], "2024-01-01T02:00:00.1234567+02:00");
            }
        }

        let metrics = relay.service.metrics();
        wait_until(|| metrics.observer_frames_sent.load(Ordering::Relaxed) == 6).await;

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_ping_answered_with_pong() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let mut socket = connect_observer(&relay).await;

        socket
            .send(Message::Ping(b"gridwatch".to_vec().into()))
            .await
            .unwrap();

        match next_frame(&mut socket).await {
            Message::Pong(payload) => assert_eq!(&payload[..], b"gridwatch"),
            other => panic!("expected a pong, got {other:?}"),
        }

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_observers() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let mut socket = connect_observer(&relay).await;

        relay.service.shutdown();

        assert!(matches!(next_frame(&mut socket).await, Message::Close(_)));
        let metrics = relay.service.metrics();
        wait_until(|| metrics.observers_connected.load(Ordering::Relaxed) == 0).await;
        relay.stop().await.unwrap();
    }
}
