//! Subscription validation handshake.

use crate::domain::broadcast::BroadcastMessage;
use crate::domain::events::{HandshakeAck, ProprietaryEvent, SubscriptionValidationData};
use crate::relay::EventRelay;
use tracing::{info, warn};

/// Completes endpoint-ownership handshakes.
///
/// Observers see the validation event before the acknowledgement leaves, so
/// a dashboard shows the handshake as it happens.
#[derive(Clone)]
pub struct HandshakeResponder {
    relay: EventRelay,
}

impl HandshakeResponder {
    pub fn new(relay: EventRelay) -> Self {
        Self { relay }
    }

    /// Echo the validation event to observers, then acknowledge `data`.
    ///
    /// A hub fault is logged and never changes the acknowledgement.
    pub async fn handle_validation(
        &self,
        event: &ProprietaryEvent,
        data: SubscriptionValidationData,
    ) -> HandshakeAck {
        let echoed = match BroadcastMessage::from_proprietary(event) {
            Ok(message) => self.relay.send(message).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(error) = echoed {
            warn!(event_id = %event.id, %error, "Failed to echo validation event");
        }

        info!(
            event_id = %event.id,
            has_validation_url = data.validation_url.is_some(),
            "Subscription validation acknowledged"
        );

        HandshakeAck {
            validation_response: data.validation_code,
        }
    }
}
