// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Gridwatch Webhook - receives pushed events and relays them to observers.
//!
//! The distribution service POSTs events to the ingest path. Each request
//! declares what it is through the `aeg-event-type` header: a subscription
//! validation handshake, or a notification batch in either the proprietary
//! or the standard (`specversion`) envelope.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                          WEBHOOK RELAY                              │
//! ├────────────────────────────────────────────────────────────────────┤
//! │   POST/OPTIONS /api/updates             GET /hubs/gridevents (WS)   │
//! │            │                                     ▲                  │
//! │  ┌─────────┴──────────┐                          │                  │
//! │  │  Tracing → Limit   │                 ┌────────┴────────┐         │
//! │  └─────────┬──────────┘                 │ ObserverSession │         │
//! │            │                            └────────┬────────┘         │
//! │   aeg-event-type?                                │                  │
//! │     ├─ SubscriptionValidation → HandshakeResponder ─┐               │
//! │     ├─ Notification → classify → EventRelay ────────┼──→ Hub ───────┘
//! │     └─ other → 400                                  │               │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gw_webhook::{RelayConfig, RelayService};
//!
//! let service = RelayService::new(RelayConfig::default())?;
//! service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod endpoint;
pub mod handshake;
pub mod middleware;
pub mod relay;
pub mod service;
pub mod ws;

// Re-exports for public API
pub use domain::config::RelayConfig;
pub use domain::error::{IngestError, RelayError, ServiceError};
pub use domain::{
    classify_document, is_standard_envelope, BroadcastMessage, EnvelopeKind, EventDeliveryType,
    EventTime, HandshakeAck, ProprietaryEvent, StandardEvent, SubscriptionValidationData,
    GRID_UPDATE,
};
pub use endpoint::{ingest_router, IngestState};
pub use handshake::HandshakeResponder;
pub use middleware::RelayMetrics;
pub use relay::{EventRelay, RelayReport};
pub use service::RelayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
