//! Composition backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::composition::HttpCompositionConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the composition REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn http_config(&self) -> HttpCompositionConfig {
        HttpCompositionConfig::new(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    /// Validate API configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidApiUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_carries_timeout() {
        let config = ApiConfig {
            timeout_secs: 3,
            ..ApiConfig::default()
        };
        assert_eq!(config.http_config().timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_url_and_timeout() {
        let url = ApiConfig {
            base_url: "localhost".into(),
            ..ApiConfig::default()
        };
        assert_eq!(url.validate(), Err(ValidationError::InvalidApiUrl));

        let timeout = ApiConfig {
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert_eq!(timeout.validate(), Err(ValidationError::InvalidTimeout));
    }
}
