//! Domain types for the webhook receiver.
//!
//! Envelope models, classification, the observer message projection,
//! configuration, and error handling. Nothing in here performs I/O.

pub mod broadcast;
pub mod classifier;
pub mod config;
pub mod delivery;
pub mod error;
pub mod events;

// Re-exports for convenience
pub use broadcast::{BroadcastMessage, GRID_UPDATE};
pub use classifier::{classify_document, is_standard_envelope, ClassifyError, EnvelopeKind};
pub use config::{ConfigError, CorsConfig, RelayConfig};
pub use delivery::{EventDeliveryType, EVENT_TYPE_HEADER};
pub use error::{IngestError, RelayError, ServiceError};
pub use events::{
    EventTime, HandshakeAck, ProprietaryEvent, StandardEvent, SubscriptionValidationData,
};
