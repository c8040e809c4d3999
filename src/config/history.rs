//! Undo history and cross-window bus sizing

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Undo entries kept before the oldest is evicted
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Envelopes a surface may fall behind before it skips
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl HistoryConfig {
    /// Validate history configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 || self.max_size > 10_000 {
            return Err(ValidationError::InvalidHistorySize);
        }
        if self.bus_capacity == 0 || self.bus_capacity > 65_536 {
            return Err(ValidationError::InvalidBusCapacity);
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

fn default_max_size() -> usize {
    100
}

fn default_bus_capacity() -> usize {
    256
}
