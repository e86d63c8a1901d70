//! Projection of accepted events onto the observer message.
//!
//! Both envelope kinds are projected onto the same 5-tuple so observers can
//! render them uniformly:
//!
//! | # | Argument           | Proprietary   | Standard       |
//! |---|--------------------|---------------|----------------|
//! | 0 | id                 | `id`          | `id`           |
//! | 1 | type               | `eventType`   | `type`         |
//! | 2 | subject            | `subject`     | `subject`/null |
//! | 3 | time               | `eventTime`   | `time`/null    |
//! | 4 | serialized record  | pretty JSON in the event's own layout |

use crate::domain::events::{EventTime, ProprietaryEvent, StandardEvent};
use gw_hub::HubMessage;
use serde_json::Value;

/// Name of the client method observers receive events on.
pub const GRID_UPDATE: &str = "gridupdate";

/// The message every observer receives for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastMessage {
    pub id: String,
    pub event_type: String,
    pub subject: Option<String>,
    pub time: Option<EventTime>,
    pub record: String,
}

impl BroadcastMessage {
    pub fn from_proprietary(event: &ProprietaryEvent) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: event.id.clone(),
            event_type: event.event_type.clone(),
            subject: Some(event.subject.clone()),
            time: Some(event.event_time.clone()),
            record: serde_json::to_string_pretty(event)?,
        })
    }

    pub fn from_standard(event: &StandardEvent) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: event.id.clone(),
            event_type: event.event_type.clone(),
            subject: event.subject.clone(),
            time: event.time.clone(),
            record: serde_json::to_string_pretty(event)?,
        })
    }

    /// Positional arguments in the order observers expect them.
    pub fn into_arguments(self) -> Vec<Value> {
        vec![
            Value::String(self.id),
            Value::String(self.event_type),
            self.subject.map_or(Value::Null, Value::String),
            self.time
                .map_or(Value::Null, |t| Value::String(t.as_str().to_string())),
            Value::String(self.record),
        ]
    }

    pub fn into_hub_message(self) -> HubMessage {
        HubMessage::new(GRID_UPDATE, self.into_arguments())
    }
}
