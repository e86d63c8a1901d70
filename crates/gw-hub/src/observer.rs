//! # Observers
//!
//! The receiving side of the hub. One [`Observer`] per connected client.

use crate::message::HubMessage;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors from observer receive operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// The hub was dropped.
    #[error("hub closed")]
    Closed,
}

/// Identifier of a connected observer.
///
/// UUID v7, so identifiers sort by connection time in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverId(Uuid);

impl ObserverId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered observer.
///
/// Dropping the handle unregisters it from the hub.
pub struct Observer {
    id: ObserverId,
    receiver: broadcast::Receiver<HubMessage>,
    skipped: u64,
}

impl Observer {
    pub(crate) fn new(receiver: broadcast::Receiver<HubMessage>) -> Self {
        Self {
            id: ObserverId::new(),
            receiver,
            skipped: 0,
        }
    }

    /// Observer identifier.
    #[must_use]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Messages skipped because this observer fell behind.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Wait for the next message.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next message in broadcast order
    /// - `None` - The hub was dropped
    pub async fn recv(&mut self) -> Option<HubMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.skipped += count;
                    warn!(observer_id = %self.id, skipped = count, "Observer lagged, messages dropped");
                }
            }
        }
    }

    /// Take the next message if one is already queued.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - A message was queued
    /// - `Ok(None)` - Nothing queued
    /// - `Err(ObserverError::Closed)` - The hub was dropped
    pub fn try_recv(&mut self) -> Result<Option<HubMessage>, ObserverError> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Ok(Some(message)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(ObserverError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.skipped += count;
                }
            }
        }
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        debug!(observer_id = %self.id, "Observer unregistered");
    }
}
