//! Observer channel over WebSocket.
//!
//! Browser dashboards connect to the hub path and receive each relayed
//! event as `{"type":1,"target":"gridupdate","arguments":[...]}`.

pub mod session;

pub use session::{ObserverSession, SessionEnd};

use crate::middleware::RelayMetrics;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};
use gw_hub::InMemoryHub;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Shared state for the observer route.
#[derive(Clone)]
pub struct ObserverState {
    pub hub: Arc<InMemoryHub>,
    pub metrics: Arc<RelayMetrics>,
    pub ping_interval: Duration,
    /// Flips to `true` once the server starts shutting down
    pub shutdown: watch::Receiver<bool>,
}

/// `GET` handler: upgrade and register a new observer.
pub async fn observer_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<ObserverState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let observer = state.hub.subscribe();
        ObserverSession::new(observer, state.metrics, state.ping_interval, state.shutdown)
            .run(socket)
            .await;
    })
}
