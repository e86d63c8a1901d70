//! # Hub Publisher
//!
//! Defines the broadcasting side of the hub.

use crate::message::HubMessage;
use crate::observer::Observer;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Errors raised by a hub implementation.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub no longer accepts messages.
    #[error("hub closed")]
    Closed,

    /// A message could not be encoded for the wire.
    #[error("failed to encode hub message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// The broadcast capability producers depend on.
///
/// Implementations are internally synchronised; callers take no lock.
#[async_trait]
pub trait Hub: Send + Sync {
    /// Push `message` to every currently connected observer.
    ///
    /// # Returns
    ///
    /// The number of observers the message was queued for. Zero observers
    /// is a successful broadcast.
    async fn broadcast(&self, message: HubMessage) -> Result<usize, HubError>;

    /// Number of observers currently connected.
    fn observer_count(&self) -> usize;
}

/// In-memory hub backed by `tokio::sync::broadcast`.
///
/// Every observer gets its own cursor into a shared ring buffer of
/// `capacity` messages.
pub struct InMemoryHub {
    sender: broadcast::Sender<HubMessage>,
    messages_broadcast: AtomicU64,
    capacity: usize,
}

impl InMemoryHub {
    /// Create a hub with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a hub buffering up to `capacity` messages per observer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            messages_broadcast: AtomicU64::new(0),
            capacity,
        }
    }

    /// Register a new observer. It receives every message broadcast after
    /// this call; dropping it unregisters.
    #[must_use]
    pub fn subscribe(&self) -> Observer {
        let observer = Observer::new(self.sender.subscribe());
        debug!(observer_id = %observer.id(), "Observer registered");
        observer
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total messages broadcast since creation.
    #[must_use]
    pub fn messages_broadcast(&self) -> u64 {
        self.messages_broadcast.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hub for InMemoryHub {
    async fn broadcast(&self, message: HubMessage) -> Result<usize, HubError> {
        self.messages_broadcast.fetch_add(1, Ordering::Relaxed);
        let target = message.target.clone();

        match self.sender.send(message) {
            Ok(observers) => {
                debug!(message_target = %target, observers, "Message broadcast");
                Ok(observers)
            }
            Err(_) => {
                // No observers connected; the message has nowhere to go
                debug!(message_target = %target, "Message dropped (no observers)");
                Ok(0)
            }
        }
    }

    fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
