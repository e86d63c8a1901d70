//! # Gridwatch Telemetry
//!
//! Logging and distributed tracing for the relay.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gw_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).await?;
//!     // Spans and logs are collected until the guard drops
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP collector; no export when unset |
//! | `OTEL_SERVICE_NAME` | `gridwatch` | Service name in traces |
//! | `GW_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `GW_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `GW_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `GW_ENVIRONMENT` | `dev` | `deployment.environment` resource attribute |

mod config;
mod tracing_setup;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use tracing_setup::{build_filter, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, when configured, trace export.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, it flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let tracing_guard = tracing_setup::init_tracing(&config).await?;
    Ok(TelemetryGuard {
        _tracing: tracing_guard,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
