//! Envelope classification.
//!
//! An event is in the standard envelope iff it is a JSON object with a key
//! named exactly `specversion`. The value of that key is never inspected.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Attribute whose presence marks the standard envelope.
pub const VERSION_MARKER: &str = "specversion";

/// Which envelope format a body uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Standard,
    Proprietary,
}

/// Fault raised while probing a value for the version marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Probe `value` for the version marker.
pub fn probe_version_marker(value: &Value) -> Result<bool, ClassifyError> {
    match value {
        Value::Object(map) => Ok(map.contains_key(VERSION_MARKER)),
        other => Err(ClassifyError::NotAnObject(json_kind(other))),
    }
}

/// `true` iff `value` is a standard-envelope event.
///
/// Never fails: a probe fault falls back to `false`.
pub fn is_standard_envelope(value: &Value) -> bool {
    match probe_version_marker(value) {
        Ok(found) => found,
        Err(e) => {
            debug!(error = %e, "Version marker probe failed, treating as proprietary");
            false
        }
    }
}

/// Classify a whole request document.
///
/// Batches are homogeneous, so an array is classified by its leading event.
/// An empty array has nothing to relay and is reported as proprietary.
pub fn classify_document(document: &Value) -> EnvelopeKind {
    let representative = match document {
        Value::Array(items) => items.first(),
        other => Some(other),
    };

    match representative {
        Some(event) if is_standard_envelope(event) => EnvelopeKind::Standard,
        _ => EnvelopeKind::Proprietary,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
