use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::endpoint::MetricsEndpointOptions;
use crate::error::{MetricsError, Result};

/// Transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to (e.g. "127.0.0.1:9464")
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: "127.0.0.1:9464".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            MetricsError::InvalidConfig(format!("listen_addr {:?}: {}", self.listen_addr, e))
        })
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Process configuration, loaded from TOML and overridden from the environment.
///
/// ```toml
/// [server]
/// listen_addr = "0.0.0.0:9464"
///
/// [endpoint]
/// id = "metrics"
/// path = "/actuator/metrics"
/// enabled = true
///
/// [log]
/// level = "debug"
/// json = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub server: ServerConfig,
    pub endpoint: MetricsEndpointOptions,
    pub log: LogConfig,
}

impl MetricsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MetricsError::InvalidConfig(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Apply `METRICS_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("METRICS_LISTEN_ADDR") {
            self.server.listen_addr = v;
        }
        if let Some(v) = lookup("METRICS_ENDPOINT_ID") {
            self.endpoint.id = v;
        }
        if let Some(v) = lookup("METRICS_ENDPOINT_PATH") {
            self.endpoint.path = v;
        }
        if let Some(v) = lookup("METRICS_ENDPOINT_ENABLED") {
            self.endpoint.enabled = parse_bool("METRICS_ENDPOINT_ENABLED", &v)?;
        }
        if let Some(v) = lookup("METRICS_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = lookup("METRICS_LOG_JSON") {
            self.log.json = parse_bool("METRICS_LOG_JSON", &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.server.socket_addr()?;
        self.endpoint.validate()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MetricsError::InvalidConfig(format!(
            "{key}: expected a boolean, got {value:?}"
        ))),
    }
}
