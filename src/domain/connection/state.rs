//! Connection lifecycle states for a streaming socket client.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle of one logical streaming connection.
///
/// ```text
/// Disconnected ──connect()──▶ Connecting ──open──▶ Connected
///                                 │                    │
///                            open failed             close
///                                 ▼                    ▼
///                            Reconnecting ◀────────────┘
///                                 │
///                        timer fires ──▶ Connecting
///                                 │
///                     attempts > max ──▶ Failed (terminal)
/// ```
///
/// Teardown via `disconnect()` is a forced move to `Disconnected` from any
/// state and is not routed through the transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl ConnectionState {
    /// All states, in display order.
    pub const ALL: [ConnectionState; 5] = [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Reconnecting,
        ConnectionState::Failed,
    ];

    /// True while an open connection or an attempt to open one is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    /// Lowercase label used in logs and health reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connecting, Failed)
                | (Connecting, Disconnected)
                | (Connected, Reconnecting)
                | (Connected, Failed)
                | (Connected, Disconnected)
                | (Reconnecting, Connecting)
                | (Reconnecting, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Reconnecting, Failed, Disconnected],
            Connected => vec![Reconnecting, Failed, Disconnected],
            Reconnecting => vec![Connecting, Disconnected],
            Failed => vec![],
        }
    }
}
