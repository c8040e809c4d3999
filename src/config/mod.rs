//! Application configuration module
//!
//! Configuration is read from environment variables with the `STUDIO_SYNC`
//! prefix; nested values are separated by double underscores. Every section
//! has defaults, so an empty environment yields a runnable local setup.
//!
//! # Example
//!
//! ```no_run
//! use studio_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Streaming from {}", config.socket.base_url);
//! ```

mod api;
mod error;
mod history;
mod logging;
mod socket;
mod storage;

pub use api::ApiConfig;
pub use error::{ConfigError, ValidationError};
pub use history::HistoryConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use socket::SocketConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Telemetry socket address and reconnect backoff
    #[serde(default)]
    pub socket: SocketConfig,

    /// Where surface snapshots are persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Undo depth and bus sizing
    #[serde(default)]
    pub history: HistoryConfig,

    /// Composition REST backend
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `STUDIO_SYNC__*` variables:
    ///
    /// - `STUDIO_SYNC__SOCKET__BASE_URL=wss://studio.local` -> `socket.base_url`
    /// - `STUDIO_SYNC__HISTORY__MAX_SIZE=50` -> `history.max_size`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STUDIO_SYNC")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.socket.validate()?;
        self.storage.validate()?;
        self.history.validate()?;
        self.api.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Loads and validates in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }
}
