//! # Integration Flows
//!
//! Each flow starts a full [`gw_webhook::RelayService`] on an ephemeral
//! port, drives it with a real HTTP client, and asserts what a hub observer
//! receives, either subscribed in-process or over the WebSocket hub path.

pub mod flows;
pub mod observers;
