//! Aggregated connection health for diagnostics.

use serde::Serialize;
use std::collections::BTreeMap;

use super::ConnectionState;

/// Count of pooled connections per state.
///
/// Rendered by the UI as a passive status indicator; it never blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub total: usize,
    pub by_state: BTreeMap<ConnectionState, usize>,
}

impl HealthStatus {
    /// Builds a report from an iterator of client states.
    pub fn from_states(states: impl IntoIterator<Item = ConnectionState>) -> Self {
        let mut status = HealthStatus::default();
        for state in states {
            *status.by_state.entry(state).or_insert(0) += 1;
            status.total += 1;
        }
        status
    }

    /// Number of clients currently in `state`.
    pub fn count(&self, state: ConnectionState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }

    /// True when every pooled client is connected.
    pub fn all_connected(&self) -> bool {
        self.count(ConnectionState::Connected) == self.total
    }
}
