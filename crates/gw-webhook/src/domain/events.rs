//! Event envelope models for both delivery formats.
//!
//! - [`ProprietaryEvent`]: the distribution service's own envelope
//!   (`id`, `eventType`, `subject`, `eventTime`, `data`).
//! - [`StandardEvent`]: the cross-vendor envelope, identified by the
//!   mandatory `specversion` attribute.
//!
//! Request bodies carry either a single envelope object or an array of them.

use crate::domain::error::IngestError;
use chrono::DateTime;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Event timestamp.
///
/// Must be valid RFC 3339, but is written back exactly as received: the
/// offset and fractional digits the upstream chose are what observers see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTime(String);

impl EventTime {
    /// Text as received.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EventTime {
    type Err = chrono::ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(raw)?;
        Ok(Self(raw.to_string()))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|e| de::Error::custom(format!("invalid RFC 3339 time {raw:?}: {e}")))
    }
}

/// Keeps an explicit `null` distinct from an absent field.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Event in the distribution service's proprietary envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProprietaryEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub subject: String,
    pub event_type: String,
    pub event_time: EventTime,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,
}

impl ProprietaryEvent {
    /// Decode the validation payload carried by a subscription validation event.
    pub fn validation_data(&self) -> Result<SubscriptionValidationData, IngestError> {
        SubscriptionValidationData::deserialize(&self.data)
            .map_err(IngestError::MissingValidationData)
    }
}

/// Event in the cross-vendor standard envelope.
///
/// Attributes not modelled here are kept as extension attributes and
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub specversion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Payload of a subscription validation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionValidationData {
    /// Code that must be echoed back to prove endpoint ownership.
    pub validation_code: String,
    /// Manual validation link, present on newer API versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_url: Option<String>,
}

/// Response body of a completed subscription handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeAck {
    pub validation_response: String,
}

/// Decode a batch of events from an already-parsed document.
///
/// An array yields one event per element in array order; any other value is
/// treated as a batch of one.
pub fn batch_from_value<T: DeserializeOwned>(document: Value) -> Result<Vec<T>, IngestError> {
    match document {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(IngestError::MalformedBody))
            .collect(),
        single => Ok(vec![
            serde_json::from_value(single).map_err(IngestError::MalformedBody)?
        ]),
    }
}

/// Decode exactly one event from a raw body.
///
/// Accepts a bare envelope object or an array holding a single envelope.
pub fn single_from_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T, IngestError> {
    let document: Value = serde_json::from_slice(body).map_err(IngestError::MalformedBody)?;
    let mut batch = batch_from_value(document)?;
    match batch.len() {
        1 => Ok(batch.remove(0)),
        n => Err(IngestError::UnexpectedBatchSize(n)),
    }
}
