//! # Gridwatch Hub - Real-Time Observer Fan-Out
//!
//! The hub is the delivery channel between the webhook receiver and every
//! connected observer. It exposes exactly one capability to producers:
//! broadcast a named message with an ordered argument list to everyone
//! currently listening.
//!
//! ```text
//! ┌──────────────┐   broadcast()   ┌──────────────┐   recv()   ┌────────────┐
//! │ Event Relay  │ ──────────────→ │     Hub      │ ─────────→ │ Observer 1 │
//! └──────────────┘                 │ (broadcast   │ ─────────→ │ Observer 2 │
//!                                  │   channel)   │ ─────────→ │ Observer N │
//!                                  └──────────────┘            └────────────┘
//! ```
//!
//! ## Delivery semantics
//!
//! - Best-effort and at-most-once per observer: there is no acknowledgement
//!   and no retry.
//! - Observers that fall more than the channel capacity behind skip the
//!   messages they missed and keep receiving from the newest point.
//! - Broadcasting with nobody connected is not an error.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod message;
pub mod observer;
pub mod publisher;

pub use message::HubMessage;
pub use observer::{Observer, ObserverError, ObserverId};
pub use publisher::{Hub, HubError, InMemoryHub};

/// Messages buffered per observer before a slow observer starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
