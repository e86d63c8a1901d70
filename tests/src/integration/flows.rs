//! # End-to-End Relay Flows
//!
//! ## Flows Tested:
//!
//! 1. **Handshake**: validation POST → ack body, validation event echoed to observers
//! 2. **Proprietary batch**: Notification POST → one `gridupdate` per event, in order
//! 3. **Standard batch**: `specversion` events → same projection, null subject/time
//! 4. **Rejections**: unknown type header, malformed body, oversized body
//! 5. **Capability probe**: OPTIONS → `WebHook-Allowed-*` headers, any body size
//! 6. **Lifecycle**: health, metrics, graceful shutdown

use gw_hub::{HubMessage, Observer};
use gw_webhook::{RelayConfig, RelayService, ServiceError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A relay running on an ephemeral local port.
pub struct RunningRelay {
    pub service: Arc<RelayService>,
    pub addr: SocketAddr,
    pub server: JoinHandle<Result<(), ServiceError>>,
}

impl RunningRelay {
    pub async fn start(config: RelayConfig) -> Self {
        let service = Arc::new(RelayService::new(config).expect("valid config"));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.serve(listener).await })
        };

        Self {
            service,
            addr,
            server,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn observe(&self) -> Observer {
        self.service.hub().subscribe()
    }

    pub async fn stop(self) -> Result<(), ServiceError> {
        self.service.shutdown();
        tokio::time::timeout(Duration::from_secs(5), self.server)
            .await
            .expect("server stops within 5s")
            .expect("server task")
    }
}

/// Wait for the next message an observer receives.
pub async fn next_message(observer: &mut Observer) -> HubMessage {
    tokio::time::timeout(Duration::from_secs(2), observer.recv())
        .await
        .expect("message within 2s")
        .expect("hub open")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, StatusCode};
    use serde_json::{json, Value};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const INGEST: &str = "/api/updates";

    fn blob_created(id: &str) -> Value {
        json!({
            "id": id,
            "topic": "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/sa",
            "subject": format!("/blobServices/default/containers/c/blobs/{id}.png"),
            "eventType": "Microsoft.Storage.BlobCreated",
            "eventTime": "2024-03-01T12:00:00Z",
            "data": { "api": "PutBlockList", "contentLength": 524288 },
            "dataVersion": "",
            "metadataVersion": "1"
        })
    }

    fn item_received(id: &str, subject: Option<&str>) -> Value {
        let mut event = json!({
            "id": id,
            "source": "/contoso/items",
            "type": "Contoso.Items.ItemReceived",
            "specversion": "1.0",
            "time": "2024-03-01T12:00:00Z",
            "data": { "itemSku": "Standard" }
        });
        if let Some(subject) = subject {
            event["subject"] = json!(subject);
        }
        event
    }

    async fn post(relay: &RunningRelay, event_type: &str, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(relay.url(INGEST))
            .header("aeg-event-type", event_type)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_subscription_handshake() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let mut observer = relay.observe();

        let body = json!([{
            "id": "2d1781af-3a4c-4d7c-bd0c-e34b19da4e66",
            "topic": "/subscriptions/xx/resourceGroups/rg/providers/Microsoft.EventGrid/topics/t",
            "subject": "",
            "eventType": "Microsoft.EventGrid.SubscriptionValidationEvent",
            "eventTime": "2024-03-01T12:00:00Z",
            "data": {
                "validationCode": "512d38b6-c7b8-40c8-89fe-f46f9e9622b6",
                "validationUrl": "https://rp-eastus2.eventgrid.azure.net/validate?id=x"
            },
            "dataVersion": "1",
            "metadataVersion": "1"
        }]);

        let response = post(&relay, "SubscriptionValidation", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let ack: Value = response.json().await.unwrap();
        assert_eq!(
            ack,
            json!({ "validationResponse": "512d38b6-c7b8-40c8-89fe-f46f9e9622b6" })
        );

        let echoed = next_message(&mut observer).await;
        assert_eq!(echoed.target, "gridupdate");
        assert_eq!(echoed.arguments[0], "2d1781af-3a4c-4d7c-bd0c-e34b19da4e66");
        assert_eq!(
            echoed.arguments[1],
            "Microsoft.EventGrid.SubscriptionValidationEvent"
        );

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_proprietary_batch_relayed_in_order() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let mut first = relay.observe();
        let mut second = relay.observe();

        let response = post(
            &relay,
            "Notification",
            json!([blob_created("a"), blob_created("b"), blob_created("c")]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.bytes().await.unwrap().is_empty());

        for observer in [&mut first, &mut second] {
            for id in ["a", "b", "c"] {
                let message = next_message(observer).await;
                assert_eq!(message.arguments.len(), 5);
                assert_eq!(message.arguments[0], id);
                assert_eq!(message.arguments[1], "Microsoft.Storage.BlobCreated");
                assert_eq!(message.arguments[3], "2024-03-01T12:00:00Z");

                let record: Value =
                    serde_json::from_str(message.arguments[4].as_str().unwrap()).unwrap();
                assert_eq!(record["data"]["contentLength"], 524288);
                assert_eq!(record["metadataVersion"], "1");
            }
        }

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_standard_batch_relayed() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let mut observer = relay.observe();

        let response = post(
            &relay,
            "Notification",
            json!([item_received("x", Some("items/1")), item_received("y", None)]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let x = next_message(&mut observer).await;
        assert_eq!(x.arguments[0], "x");
        assert_eq!(x.arguments[1], "Contoso.Items.ItemReceived");
        assert_eq!(x.arguments[2], "items/1");

        let y = next_message(&mut observer).await;
        assert_eq!(y.arguments[0], "y");
        assert_eq!(y.arguments[2], Value::Null);

        let record: Value = serde_json::from_str(y.arguments[4].as_str().unwrap()).unwrap();
        assert_eq!(record["specversion"], "1.0");
        assert_eq!(record["source"], "/contoso/items");

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_requests_broadcast_nothing() {
        let mut config = RelayConfig::default();
        config.limits.max_body_size = 4096;
        let relay = RunningRelay::start(config).await;
        let mut observer = relay.observe();

        // Missing or unknown type header
        let response = reqwest::Client::new()
            .post(relay.url(INGEST))
            .json(&json!([blob_created("1")]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = post(&relay, "Heartbeat", json!([blob_created("1")])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Malformed body
        let response = reqwest::Client::new()
            .post(relay.url(INGEST))
            .header("aeg-event-type", "Notification")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());

        // Oversized body
        let batch: Vec<Value> = (0..100).map(|i| blob_created(&i.to_string())).collect();
        let response = post(&relay, "Notification", Value::Array(batch)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        assert!(observer.try_recv().unwrap().is_none());
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_capability_probe() {
        let relay = RunningRelay::start(RelayConfig::default()).await;

        let response = reqwest::Client::new()
            .request(Method::OPTIONS, relay.url(INGEST))
            .header("WebHook-Request-Origin", "eventemitter.example.com")
            .header("WebHook-Request-Callback", "https://example.com/approve")
            .header("WebHook-Request-Rate", "120")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["WebHook-Allowed-Rate"], "*");
        assert_eq!(
            response.headers()["WebHook-Allowed-Origin"],
            "eventemitter.example.com"
        );

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_capability_options_ignores_body_limit() {
        let mut config = RelayConfig::default();
        config.limits.max_body_size = 64;
        let relay = RunningRelay::start(config).await;

        let response = reqwest::Client::new()
            .request(Method::OPTIONS, relay.url(INGEST))
            .header("WebHook-Request-Origin", "eventemitter.example.com")
            .body(vec![b'x'; 16 * 1024])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["WebHook-Allowed-Rate"], "*");

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_all_arrive() {
        let relay = Arc::new(RunningRelay::start(RelayConfig::default()).await);
        let mut observer = relay.observe();

        let mut requests = Vec::new();
        for batch in 0..4 {
            let relay = Arc::clone(&relay);
            requests.push(tokio::spawn(async move {
                let events: Vec<Value> = (0..5)
                    .map(|i| blob_created(&format!("{batch}-{i}")))
                    .collect();
                post(&relay, "Notification", Value::Array(events)).await.status()
            }));
        }
        for request in requests {
            assert_eq!(request.await.unwrap(), StatusCode::OK);
        }

        let mut per_batch: Vec<Vec<String>> = vec![Vec::new(); 4];
        for _ in 0..20 {
            let message = next_message(&mut observer).await;
            let id = message.arguments[0].as_str().unwrap().to_string();
            let batch: usize = id.split('-').next().unwrap().parse().unwrap();
            per_batch[batch].push(id);
        }

        // No cross-request ordering, but each batch keeps its own order
        for (batch, ids) in per_batch.iter().enumerate() {
            let expected: Vec<String> = (0..5).map(|i| format!("{batch}-{i}")).collect();
            assert_eq!(ids, &expected);
        }

        let relay = Arc::try_unwrap(relay).ok().expect("sole owner");
        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let client = reqwest::Client::new();

        let health: Value = client
            .get(relay.url("/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        post(&relay, "Notification", json!([blob_created("m")])).await;
        post(&relay, "Bogus", json!([])).await;

        let metrics: Value = client
            .get(relay.url("/metrics"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(metrics["requests"]["notification"], 1);
        assert_eq!(metrics["requests"]["rejected"], 1);
        assert_eq!(metrics["relay"]["events_relayed"], 1);

        relay.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let relay = RunningRelay::start(RelayConfig::default()).await;
        let url = relay.url("/health");

        relay.stop().await.unwrap();

        let result = reqwest::Client::new()
            .get(url)
            .timeout(Duration::from_secs(2))
            .send()
            .await;
        assert!(result.is_err());
    }
}
