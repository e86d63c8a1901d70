//! Webhook receiver error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gw_hub::HubError;
use serde_json::json;
use tracing::error;

/// Failure while turning a request body into events.
///
/// Every variant surfaces to the caller as a 500 with a JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Body is not JSON or an entry does not match its envelope
    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// A single event was expected but the batch held some other count
    #[error("expected exactly one event, got {0}")]
    UnexpectedBatchSize(usize),

    /// Validation event carries no usable `validationCode`
    #[error("validation event has no validation code: {0}")]
    MissingValidationData(#[source] serde_json::Error),
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        error!(error = %self, "Webhook request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Failure relaying a single event to observers.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Event could not be serialized into its record
    #[error("failed to project event: {0}")]
    Projection(#[source] serde_json::Error),

    /// Hub refused the message
    #[error("hub broadcast failed: {0}")]
    Hub(#[from] HubError),
}

/// Service-level errors (startup and serving, not per request)
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(#[source] std::io::Error),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
