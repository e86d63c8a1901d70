//! # Event Relay
//!
//! Projects each accepted event onto a [`BroadcastMessage`] and pushes it to
//! the hub, one broadcast per event, in batch order. Every broadcast is
//! awaited before the next one starts.
//!
//! A fault on one event (projection or hub) is logged and counted; the rest
//! of the batch is still relayed.

use crate::domain::broadcast::BroadcastMessage;
use crate::domain::error::RelayError;
use crate::domain::events::{ProprietaryEvent, StandardEvent};
use gw_hub::Hub;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of relaying one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Events handed to the hub
    pub delivered: usize,
    /// Events dropped because of a projection or hub fault
    pub failed: usize,
}

impl RelayReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Fans accepted events out to observers.
#[derive(Clone)]
pub struct EventRelay {
    hub: Arc<dyn Hub>,
}

impl EventRelay {
    pub fn new(hub: Arc<dyn Hub>) -> Self {
        Self { hub }
    }

    /// Relay proprietary-envelope events.
    pub async fn relay_proprietary(&self, events: Vec<ProprietaryEvent>) -> RelayReport {
        let mut report = RelayReport::default();
        for event in &events {
            let outcome = match BroadcastMessage::from_proprietary(event) {
                Ok(message) => self.send(message).await,
                Err(e) => Err(RelayError::Projection(e)),
            };
            self.tally(&mut report, &event.id, outcome);
        }
        report
    }

    /// Relay standard-envelope events.
    pub async fn relay_standard(&self, events: Vec<StandardEvent>) -> RelayReport {
        let mut report = RelayReport::default();
        for event in &events {
            let outcome = match BroadcastMessage::from_standard(event) {
                Ok(message) => self.send(message).await,
                Err(e) => Err(RelayError::Projection(e)),
            };
            self.tally(&mut report, &event.id, outcome);
        }
        report
    }

    /// Broadcast a single projected message.
    pub async fn send(&self, message: BroadcastMessage) -> Result<usize, RelayError> {
        Ok(self.hub.broadcast(message.into_hub_message()).await?)
    }

    fn tally(&self, report: &mut RelayReport, event_id: &str, outcome: Result<usize, RelayError>) {
        match outcome {
            Ok(observers) => {
                debug!(event_id, observers, "Event relayed");
                report.delivered += 1;
            }
            Err(e) => {
                warn!(event_id, error = %e, "Failed to relay event");
                report.failed += 1;
            }
        }
    }
}
