//! Wire envelope carried by the cross-window bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{SurfaceId, Timestamp};

/// One published state slice.
///
/// The payload is already-serialized JSON, so only plain data can travel
/// between surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEnvelope {
    pub channel_key: String,
    pub payload: Value,
    pub timestamp: Timestamp,
    pub origin: SurfaceId,
}

impl BroadcastEnvelope {
    pub fn new(channel_key: impl Into<String>, payload: Value, origin: SurfaceId) -> Self {
        Self {
            channel_key: channel_key.into(),
            payload,
            timestamp: Timestamp::now(),
            origin,
        }
    }

    /// True when `surface` published this envelope.
    pub fn is_from(&self, surface: &SurfaceId) -> bool {
        self.origin == *surface
    }
}
