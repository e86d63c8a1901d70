//! Configuration loading: optional TOML file, then environment overrides.

use anyhow::{Context, Result};
use gw_webhook::RelayConfig;
use std::path::Path;

/// Path of an optional TOML configuration file.
pub const CONFIG_FILE_VAR: &str = "GW_CONFIG_FILE";

/// Load configuration from the process environment.
pub fn load_config() -> Result<RelayConfig> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` for environment variables.
///
/// # Environment Variables
///
/// - `GW_CONFIG_FILE`: TOML file to start from (default: built-in defaults)
/// - `GW_HTTP_HOST`: Bind address
/// - `GW_HTTP_PORT`: Bind port
/// - `GW_INGEST_PATH`: Webhook path
/// - `GW_HUB_PATH`: Observer WebSocket path
pub fn load_config_from<F>(lookup: F) -> Result<RelayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_FILE_VAR) {
        Some(path) => read_config_file(Path::new(&path))?,
        None => RelayConfig::default(),
    };

    if let Some(host) = lookup("GW_HTTP_HOST") {
        config.http.host = host
            .parse()
            .with_context(|| format!("GW_HTTP_HOST is not an IP address: {host}"))?;
    }
    if let Some(port) = lookup("GW_HTTP_PORT") {
        config.http.port = port
            .parse()
            .with_context(|| format!("GW_HTTP_PORT is not a port number: {port}"))?;
    }
    if let Some(path) = lookup("GW_INGEST_PATH") {
        config.routes.ingest_path = path;
    }
    if let Some(path) = lookup("GW_HUB_PATH") {
        config.routes.hub_path = path;
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<RelayConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
}
