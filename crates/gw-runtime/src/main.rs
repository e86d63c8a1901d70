//! # Gridwatch
//!
//! Webhook relay executable.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs, optional trace export)
//! 2. Load configuration (TOML file, then environment)
//! 3. Validate configuration and build the relay service
//! 4. Serve until Ctrl+C, then drain in-flight requests and close observers

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use gw_telemetry::{init_telemetry, TelemetryConfig};
use gw_webhook::RelayService;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .await
        .context("failed to initialize telemetry")?;

    let config = config::load_config()?;
    let service = Arc::new(RelayService::new(config).context("invalid configuration")?);

    info!(
        version = gw_webhook::VERSION,
        addr = %service.http_addr(),
        "Starting Gridwatch relay"
    );

    let mut server = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.start().await })
    };

    info!("Relay is running. Press Ctrl+C to stop.");
    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("Shutting down");
            service.shutdown();
            server.await
        }
        // Server exited on its own (bind failure or I/O error)
        outcome = &mut server => outcome,
    };

    match outcome.context("server task panicked")? {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Relay stopped with an error");
            Err(e.into())
        }
    }
}
