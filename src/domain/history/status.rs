//! Command history activity.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::StateMachine;

/// What the command stack is doing right now.
///
/// Only one of execute/undo/redo may be in flight. Every busy state returns
/// to `Idle` when its operation finishes, whatever the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    #[default]
    Idle,
    Executing,
    Undoing,
    Redoing,
}

impl HistoryStatus {
    pub fn is_busy(&self) -> bool {
        !matches!(self, HistoryStatus::Idle)
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HistoryStatus::Idle => "idle",
            HistoryStatus::Executing => "executing",
            HistoryStatus::Undoing => "undoing",
            HistoryStatus::Redoing => "redoing",
        };
        f.write_str(label)
    }
}

impl StateMachine for HistoryStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use HistoryStatus::*;
        matches!(
            (self, target),
            (Idle, Executing)
                | (Idle, Undoing)
                | (Idle, Redoing)
                | (Executing, Idle)
                | (Undoing, Idle)
                | (Redoing, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use HistoryStatus::*;
        match self {
            Idle => vec![Executing, Undoing, Redoing],
            Executing | Undoing | Redoing => vec![Idle],
        }
    }
}
