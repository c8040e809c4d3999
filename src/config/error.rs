//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Socket base URL must use ws:// or wss://")]
    InvalidSocketUrl,

    #[error("Composition API URL must use http:// or https://")]
    InvalidApiUrl,

    #[error("Reconnect delays must be positive and initial_delay_ms <= max_delay_ms")]
    InvalidReconnectDelay,

    #[error("Reconnect multiplier must be at least 1.0")]
    InvalidMultiplier,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("History size must be between 1 and 10000")]
    InvalidHistorySize,

    #[error("Bus capacity must be between 1 and 65536")]
    InvalidBusCapacity,

    #[error("Storage namespace may only contain letters, digits, '-' and '_'")]
    InvalidNamespace,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
