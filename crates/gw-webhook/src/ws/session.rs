//! One WebSocket session per connected observer.
//!
//! The session forwards every hub message as a text frame, answers pings,
//! sends keep-alive pings, and unregisters from the hub when the socket
//! closes or the server shuts down. Anything else the client sends is
//! ignored.

use crate::middleware::RelayMetrics;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use gw_hub::{HubMessage, Observer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client sent a close frame or the stream ended
    ClientClosed,
    /// Socket read or write failed
    SocketError,
    /// Hub shut down
    HubClosed,
    /// Server is shutting down
    ServerShutdown,
}

/// Observer WebSocket session
pub struct ObserverSession {
    observer: Observer,
    metrics: Arc<RelayMetrics>,
    ping_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ObserverSession {
    pub fn new(
        observer: Observer,
        metrics: Arc<RelayMetrics>,
        ping_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            observer,
            metrics,
            ping_interval,
            shutdown,
        }
    }

    /// Drive the session until either side closes.
    pub async fn run(mut self, socket: WebSocket) -> SessionEnd {
        let observer_id = self.observer.id();
        info!(%observer_id, "Observer connected");
        self.metrics.record_observer_connect();

        let (mut sender, mut receiver) = socket.split();

        let mut ping = tokio::time::interval(self.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ping.tick().await;

        let end = loop {
            tokio::select! {
                message = self.observer.recv() => {
                    let Some(message) = message else {
                        break SessionEnd::HubClosed;
                    };
                    let Some(frame) = encode(&message) else {
                        continue;
                    };
                    if let Err(e) = sender.send(Message::Text(frame)).await {
                        debug!(%observer_id, error = %e, "Failed to push frame");
                        break SessionEnd::SocketError;
                    }
                    self.metrics.record_frame_sent();
                }
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(%observer_id, error = %e, "Failed to send pong");
                            break SessionEnd::SocketError;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break SessionEnd::ClientClosed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(%observer_id, error = %e, "WebSocket error");
                        break SessionEnd::SocketError;
                    }
                },
                _ = stopping(&mut self.shutdown) => {
                    let _ = sender.send(Message::Close(None)).await;
                    break SessionEnd::ServerShutdown;
                }
                _ = ping.tick() => {
                    if let Err(e) = sender.send(Message::Ping(Vec::new())).await {
                        debug!(%observer_id, error = %e, "Failed to send keep-alive ping");
                        break SessionEnd::SocketError;
                    }
                }
            }
        };

        self.metrics.record_observer_disconnect();
        info!(
            %observer_id,
            reason = ?end,
            skipped = self.observer.skipped(),
            "Observer disconnected"
        );
        end
    }
}

/// Resolves once shutdown starts, or the service holding the sender is gone.
async fn stopping(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}

fn encode(message: &HubMessage) -> Option<String> {
    match message.to_frame() {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(message_target = %message.target, error = %e, "Dropping unencodable hub message");
            None
        }
    }
}
