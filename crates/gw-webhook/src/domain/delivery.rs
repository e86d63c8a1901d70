//! Delivery type carried by the `aeg-event-type` request header.

use axum::http::HeaderMap;
use std::fmt;

/// Header the distribution service uses to announce the request kind.
pub const EVENT_TYPE_HEADER: &str = "aeg-event-type";

/// Header value announcing an endpoint-ownership handshake.
pub const SUBSCRIPTION_VALIDATION: &str = "SubscriptionValidation";

/// Header value announcing an event delivery.
pub const NOTIFICATION: &str = "Notification";

/// What the caller says this request is.
///
/// The mapping from header to variant is total: a missing header, a
/// non-UTF-8 value, or any unknown string is [`EventDeliveryType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventDeliveryType {
    SubscriptionValidation,
    Notification,
    Other,
}

impl EventDeliveryType {
    /// Classify a raw header value. Matching is exact and case-sensitive.
    pub fn from_header_value(value: Option<&str>) -> Self {
        match value {
            Some(SUBSCRIPTION_VALIDATION) => Self::SubscriptionValidation,
            Some(NOTIFICATION) => Self::Notification,
            _ => Self::Other,
        }
    }

    /// Classify a request by the first value of its `aeg-event-type` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_header_value(
            headers
                .get(EVENT_TYPE_HEADER)
                .and_then(|value| value.to_str().ok()),
        )
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionValidation => SUBSCRIPTION_VALIDATION,
            Self::Notification => NOTIFICATION,
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for EventDeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
