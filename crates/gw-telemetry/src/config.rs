//! Telemetry configuration from environment variables.

use std::env;

/// Default service name reported in logs and traces.
pub const DEFAULT_SERVICE_NAME: &str = "gridwatch";

/// Configuration for logging and trace export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// OTLP collector endpoint; traces are only exported when set
    pub otlp_endpoint: Option<String>,

    /// Log filter directive (e.g. `info`, `gw_webhook=debug,info`)
    pub log_level: String,

    /// Whether to write logs to stdout
    pub console_output: bool,

    /// Whether to format logs as JSON
    pub json_logs: bool,

    /// Deployment environment (dev, staging, prod)
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "dev".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: gridwatch)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint (default: unset, no export)
    /// - `GW_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `GW_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `GW_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `GW_ENVIRONMENT`: Deployment environment (default: dev)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();
        let defaults = Self::default();

        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),

            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),

            log_level: lookup("GW_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("GW_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("GW_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            environment: lookup("GW_ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Whether spans are exported to a collector.
    pub fn exports_traces(&self) -> bool {
        self.otlp_endpoint.is_some()
    }
}
