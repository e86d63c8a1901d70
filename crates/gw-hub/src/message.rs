//! # Hub Messages
//!
//! A hub message is a method invocation pushed to observers: a target name
//! plus positional arguments. On the wire it is framed as an invocation
//! object so that browser clients can dispatch on `target`.

use crate::publisher::HubError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame kind tag for an invocation pushed to observers.
pub const INVOCATION_FRAME: u8 = 1;

/// A named message with an ordered argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    /// Client-side method the observer dispatches to.
    pub target: String,
    /// Positional arguments, in the order the client method expects them.
    pub arguments: Vec<Value>,
}

#[derive(Serialize)]
struct InvocationFrame<'a> {
    #[serde(rename = "type")]
    kind: u8,
    target: &'a str,
    arguments: &'a [Value],
}

impl HubMessage {
    /// Create a message for `target` with the given arguments.
    pub fn new(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            arguments,
        }
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// Encode as the text frame sent to WebSocket observers.
    pub fn to_frame(&self) -> Result<String, HubError> {
        serde_json::to_string(&InvocationFrame {
            kind: INVOCATION_FRAME,
            target: &self.target,
            arguments: &self.arguments,
        })
        .map_err(HubError::Encode)
    }
}
