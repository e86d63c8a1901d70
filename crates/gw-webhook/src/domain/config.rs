//! Relay configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP listener
    pub http: HttpConfig,
    /// Route paths
    pub routes: RoutesConfig,
    /// Observer hub
    pub hub: HubConfig,
    /// Request limits
    pub limits: LimitsConfig,
    /// CORS for browser observers
    pub cors: CorsConfig,
}

impl RelayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.routes.ingest_path, &self.routes.hub_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath(path.clone()));
            }
        }

        let reserved = [
            self.routes.ingest_path.as_str(),
            self.routes.hub_path.as_str(),
            HEALTH_PATH,
            METRICS_PATH,
        ];
        for (i, path) in reserved.iter().enumerate() {
            if reserved[i + 1..].contains(path) {
                return Err(ConfigError::DuplicatePath((*path).to_string()));
            }
        }

        if self.hub.channel_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "hub channel_capacity cannot be 0".into(),
            ));
        }

        if self.hub.ping_interval.is_zero() {
            return Err(ConfigError::InvalidLimit(
                "hub ping_interval cannot be 0".into(),
            ));
        }

        if self.limits.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_size cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// HTTP bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// Liveness probe path.
pub const HEALTH_PATH: &str = "/health";

/// Counters path.
pub const METRICS_PATH: &str = "/metrics";

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 5000)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5000,
        }
    }
}

/// Route configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Webhook path registered with the distribution service
    pub ingest_path: String,
    /// WebSocket path observers connect to
    pub hub_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            ingest_path: "/api/updates".to_string(),
            hub_path: "/hubs/gridevents".to_string(),
        }
    }
}

/// Observer hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Messages buffered per observer before it starts skipping
    pub channel_capacity: usize,
    /// Keep-alive ping interval for WebSocket observers
    #[serde(with = "duration_serde")]
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: gw_hub::DEFAULT_CHANNEL_CAPACITY,
            ping_interval: Duration::from_secs(15),
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 1MB, the service's batch ceiling)
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers ("*" for all)
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache, in seconds
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["*".to_string()],
            max_age: 86400, // 24 hours
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Route path does not start with '/'
    #[error("invalid route path: {0:?}")]
    InvalidPath(String),
    /// Two routes share a path
    #[error("route path used more than once: {0}")]
    DuplicatePath(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}

/// Duration (de)serialization as "250ms", "15s", "2m", or bare seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" must be checked before the bare "s"/"m" suffixes
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            let mins = mins.trim().parse::<u64>().map_err(|_| "invalid minutes")?;
            mins.checked_mul(60)
                .map(Duration::from_secs)
                .ok_or("minutes out of range")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
