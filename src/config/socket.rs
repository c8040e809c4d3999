//! Telemetry socket configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::connection::ReconnectPolicy;

/// Streaming endpoint and reconnection settings
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConfig {
    /// Base address every telemetry path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay before the first reconnect, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Backoff growth factor
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Backoff ceiling, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Consecutive failures before a connection gives up (unset = never)
    pub max_attempts: Option<u32>,

    /// How often the binary logs connection health, in seconds
    #[serde(default = "default_health_interval")]
    pub health_log_interval_secs: u64,
}

impl SocketConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let policy = ReconnectPolicy::default()
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_multiplier(self.multiplier)
            .with_max_delay(Duration::from_millis(self.max_delay_ms));
        match self.max_attempts {
            Some(attempts) => policy.with_max_attempts(attempts),
            None => policy,
        }
    }

    pub fn health_log_interval(&self) -> Duration {
        Duration::from_secs(self.health_log_interval_secs)
    }

    /// Validate socket configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("ws://") && !self.base_url.starts_with("wss://") {
            return Err(ValidationError::InvalidSocketUrl);
        }
        if self.initial_delay_ms == 0 || self.initial_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ValidationError::InvalidMultiplier);
        }
        if self.health_log_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            initial_delay_ms: default_initial_delay(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay(),
            max_attempts: None,
            health_log_interval_secs: default_health_interval(),
        }
    }
}

fn default_base_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_health_interval() -> u64 {
    30
}
