use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Identity and exposure settings of the metrics endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsEndpointOptions {
    /// Endpoint identifier
    pub id: String,
    /// Base path the transport serves the endpoint under (e.g. "/metrics")
    pub path: String,
    /// When false the transport answers 404 for every request
    pub enabled: bool,
}

impl Default for MetricsEndpointOptions {
    fn default() -> Self {
        MetricsEndpointOptions {
            id: "metrics".to_string(),
            path: "/metrics".to_string(),
            enabled: true,
        }
    }
}

impl MetricsEndpointOptions {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(MetricsError::InvalidConfig(
                "endpoint id must not be empty".to_string(),
            ));
        }
        if !self.path.starts_with('/') {
            return Err(MetricsError::InvalidConfig(format!(
                "endpoint path {:?} must start with '/'",
                self.path
            )));
        }
        Ok(())
    }

    /// Path with any trailing '/' removed ("/" stays "")
    pub fn base_path(&self) -> &str {
        self.path.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = MetricsEndpointOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.base_path(), "/metrics");
    }

    #[test]
    fn test_rejects_relative_path() {
        let options = MetricsEndpointOptions::default().with_path("metrics");
        assert!(matches!(
            options.validate(),
            Err(MetricsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_empty_id() {
        let options = MetricsEndpointOptions::default().with_id(" ");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let options = MetricsEndpointOptions::default().with_path("/actuator/metrics/");
        assert_eq!(options.base_path(), "/actuator/metrics");
    }
}
