//! Per-request tracing spans.
//!
//! Each request runs inside a `webhook_request` span carrying the declared
//! delivery type, so relay and hub logs can be correlated with the call that
//! produced them. A valid W3C `traceparent` header makes the span a child of
//! the caller's trace when spans are exported.

use crate::domain::delivery::EVENT_TYPE_HEADER;
use axum::{
    body::Body,
    http::{HeaderMap, Request},
    response::Response,
};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info_span, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Tracing layer that creates spans for each request
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        let span = request_span(&req);

        Box::pin(
            async move {
                let result = inner.call(req).await;

                match &result {
                    Ok(response) => {
                        let status = response.status();
                        let span = Span::current();
                        span.record("http.status_code", status.as_u16());
                        span.record(
                            "otel.status_code",
                            if status.is_server_error() { "ERROR" } else { "OK" },
                        );
                    }
                    Err(_) => {
                        Span::current().record("otel.status_code", "ERROR");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

fn request_span<B>(req: &Request<B>) -> Span {
    let event_type = req
        .headers()
        .get(EVENT_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    let span = info_span!(
        "webhook_request",
        http.method = %req.method(),
        http.target = %req.uri().path(),
        aeg.event_type = %event_type,
        http.status_code = tracing::field::Empty,
        otel.kind = "server",
        otel.status_code = tracing::field::Empty,
    );

    if let Some(parent) = extract_trace_context(req.headers()) {
        span.set_parent(parent);
    }
    span
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Remote parent from a W3C `traceparent` header; `None` if absent or invalid.
fn extract_trace_context(headers: &HeaderMap) -> Option<opentelemetry::Context> {
    let context = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    let valid = context.span().span_context().is_valid();
    valid.then_some(context)
}
