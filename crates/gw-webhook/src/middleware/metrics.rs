//! Relay counters, exported as JSON on the metrics route.

use crate::domain::delivery::EventDeliveryType;
use std::sync::atomic::{AtomicU64, Ordering};

/// Webhook relay metrics
#[derive(Default)]
pub struct RelayMetrics {
    // Requests by delivery type
    pub validation_requests: AtomicU64,
    pub notification_requests: AtomicU64,
    pub rejected_requests: AtomicU64,
    pub failed_requests: AtomicU64,
    pub probe_requests: AtomicU64,

    // Relay counters
    pub events_relayed: AtomicU64,
    pub broadcast_failures: AtomicU64,
    pub handshakes_completed: AtomicU64,

    // Observer counters
    pub observers_connected: AtomicU64,
    pub observer_frames_sent: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted POST by its declared type
    pub fn record_request(&self, delivery: EventDeliveryType) {
        let counter = match delivery {
            EventDeliveryType::SubscriptionValidation => &self.validation_requests,
            EventDeliveryType::Notification => &self.notification_requests,
            EventDeliveryType::Other => &self.rejected_requests,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that ended in a 500
    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an OPTIONS capability probe
    pub fn record_probe(&self) {
        self.probe_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one relay pass
    pub fn record_relay(&self, delivered: usize, failed: usize) {
        self.events_relayed
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.broadcast_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn record_handshake(&self) {
        self.handshakes_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record observer connection
    pub fn record_observer_connect(&self) {
        self.observers_connected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record observer disconnection
    pub fn record_observer_disconnect(&self) {
        self.observers_connected.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_frame_sent(&self) {
        self.observer_frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "validation": self.validation_requests.load(Ordering::Relaxed),
                "notification": self.notification_requests.load(Ordering::Relaxed),
                "rejected": self.rejected_requests.load(Ordering::Relaxed),
                "failed": self.failed_requests.load(Ordering::Relaxed),
                "probes": self.probe_requests.load(Ordering::Relaxed),
            },
            "relay": {
                "events_relayed": self.events_relayed.load(Ordering::Relaxed),
                "broadcast_failures": self.broadcast_failures.load(Ordering::Relaxed),
                "handshakes": self.handshakes_completed.load(Ordering::Relaxed),
            },
            "observers": {
                "connected": self.observers_connected.load(Ordering::Relaxed),
                "frames_sent": self.observer_frames_sent.load(Ordering::Relaxed),
            }
        })
    }
}
