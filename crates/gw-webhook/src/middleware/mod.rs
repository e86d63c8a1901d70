//! Middleware stack for the webhook receiver.
//!
//! Layer order: Request → Tracing → [CORS, observer routes only | BodyLimit, ingest POST only] → Handler

pub mod cors;
pub mod metrics;
pub mod tracing;

pub use cors::create_cors_layer;
pub use metrics::RelayMetrics;
pub use self::tracing::TracingLayer;
