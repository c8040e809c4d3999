//! Command and history errors.

use thiserror::Error;

use super::HistoryStatus;
use crate::domain::foundation::ValidationError;

/// Failure inside a command's `execute` or `undo` body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Nothing to undo: command has not been executed")]
    NotExecuted,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors returned by the command stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("Command history is busy ({0})")]
    Busy(HistoryStatus),

    #[error("'{description}' failed: {source}")]
    Command {
        description: String,
        #[source]
        source: CommandError,
    },
}

impl HistoryError {
    pub fn is_busy(&self) -> bool {
        matches!(self, HistoryError::Busy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_mentions_description() {
        let err = HistoryError::Command {
            description: "Rename track to Bass".into(),
            source: CommandError::Backend("503".into()),
        };
        assert_eq!(
            err.to_string(),
            "'Rename track to Bass' failed: Backend request failed: 503"
        );
    }

    #[test]
    fn busy_displays_status() {
        assert_eq!(
            HistoryError::Busy(HistoryStatus::Undoing).to_string(),
            "Command history is busy (undoing)"
        );
    }
}
