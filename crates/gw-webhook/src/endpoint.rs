//! # Ingestion Endpoint
//!
//! The one route the distribution service talks to.
//!
//! | Method  | `aeg-event-type`         | Result                                  |
//! |---------|--------------------------|-----------------------------------------|
//! | POST    | `SubscriptionValidation` | 200 + `{"validationResponse": code}`    |
//! | POST    | `Notification`           | 200, empty; events relayed to observers |
//! | POST    | anything else / missing  | 400, empty; body never parsed           |
//! | OPTIONS | n/a                      | 200 + `WebHook-Allowed-*` headers       |
//!
//! A body that does not decode for its declared type fails the request
//! with a 500. The body size limit applies to `POST` only; the probe drains
//! whatever it is sent.

use crate::domain::classifier::{classify_document, EnvelopeKind};
use crate::domain::delivery::EventDeliveryType;
use crate::domain::error::IngestError;
use crate::domain::events::{batch_from_value, single_from_slice, ProprietaryEvent};
use crate::handshake::HandshakeResponder;
use crate::middleware::RelayMetrics;
use crate::relay::EventRelay;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info};

/// Origin the caller claims in the capability probe.
pub const REQUEST_ORIGIN_HEADER: &str = "webhook-request-origin";
/// Callback URL for manual probe approval.
pub const REQUEST_CALLBACK_HEADER: &str = "webhook-request-callback";
/// Delivery rate the caller asks for.
pub const REQUEST_RATE_HEADER: &str = "webhook-request-rate";
/// Delivery rate granted; always `*`.
pub const ALLOWED_RATE_HEADER: &str = "webhook-allowed-rate";
/// Origin granted; mirrors the requested one.
pub const ALLOWED_ORIGIN_HEADER: &str = "webhook-allowed-origin";

/// Shared state for the ingest route.
#[derive(Clone)]
pub struct IngestState {
    pub relay: EventRelay,
    pub handshake: HandshakeResponder,
    pub metrics: Arc<RelayMetrics>,
}

impl IngestState {
    pub fn new(relay: EventRelay, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            handshake: HandshakeResponder::new(relay.clone()),
            relay,
            metrics,
        }
    }
}

/// Build the ingest router mounted at `path`.
///
/// `POST` bodies over `max_body_size` bytes are refused with 413.
pub fn ingest_router(path: &str, state: IngestState, max_body_size: usize) -> Router {
    let deliveries = post(ingest).layer(RequestBodyLimitLayer::new(max_body_size));
    Router::new()
        .route(path, deliveries.options(options_probe))
        .with_state(state)
}

/// `POST` handler: branch on the declared delivery type.
pub async fn ingest(
    State(state): State<IngestState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery = EventDeliveryType::from_headers(&headers);
    state.metrics.record_request(delivery);

    let result = match delivery {
        EventDeliveryType::SubscriptionValidation => handle_validation(&state, &body).await,
        EventDeliveryType::Notification => handle_notification(&state, &body).await,
        EventDeliveryType::Other => {
            debug!("Rejecting request without a recognised event type header");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            state.metrics.record_failure();
            e.into_response()
        }
    }
}

async fn handle_validation(state: &IngestState, body: &[u8]) -> Result<Response, IngestError> {
    let event: ProprietaryEvent = single_from_slice(body)?;
    let data = event.validation_data()?;

    let ack = state.handshake.handle_validation(&event, data).await;
    state.metrics.record_handshake();

    Ok(Json(ack).into_response())
}

async fn handle_notification(state: &IngestState, body: &[u8]) -> Result<Response, IngestError> {
    let document: Value = serde_json::from_slice(body).map_err(IngestError::MalformedBody)?;

    let kind = classify_document(&document);
    let report = match kind {
        EnvelopeKind::Standard => state.relay.relay_standard(batch_from_value(document)?).await,
        EnvelopeKind::Proprietary => {
            state
                .relay
                .relay_proprietary(batch_from_value(document)?)
                .await
        }
    };
    state.metrics.record_relay(report.delivered, report.failed);

    info!(
        envelope = ?kind,
        events = report.total(),
        delivered = report.delivered,
        failed = report.failed,
        "Notification relayed"
    );

    Ok(StatusCode::OK.into_response())
}

/// `OPTIONS` handler: answer the delivery capability probe.
pub async fn options_probe(
    State(state): State<IngestState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    state.metrics.record_probe();

    let mut chunks = body.into_data_stream();
    let mut drained = 0usize;
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(bytes) => drained += bytes.len(),
            Err(e) => {
                debug!(error = %e, "Probe body ended early");
                break;
            }
        }
    }

    let origin = headers.get(REQUEST_ORIGIN_HEADER).cloned();
    debug!(
        origin = ?origin,
        drained,
        callback = ?headers.get(REQUEST_CALLBACK_HEADER),
        rate = ?headers.get(REQUEST_RATE_HEADER),
        "Webhook capability probe"
    );

    let mut response = StatusCode::OK.into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(ALLOWED_RATE_HEADER, HeaderValue::from_static("*"));
    if let Some(origin) = origin {
        response_headers.insert(ALLOWED_ORIGIN_HEADER, origin);
    }
    response
}
