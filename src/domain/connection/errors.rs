//! Connection error taxonomy.

use thiserror::Error;

use super::ConnectionState;
use crate::domain::foundation::EndpointKey;

/// Transport-level failures.
///
/// Non-fatal: they are logged and the reconnection logic proceeds through
/// its normal state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("Endpoint '{endpoint}' is not connected (state: {state})")]
    NotConnected {
        endpoint: EndpointKey,
        state: ConnectionState,
    },

    #[error("Invalid socket URL: {0}")]
    InvalidUrl(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
