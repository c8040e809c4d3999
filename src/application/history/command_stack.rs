//! Bounded undo/redo history of executed commands.
//!
//! A single [`HistoryStatus`] gates every operation: while one execute, undo
//! or redo is awaiting its round-trip, any other call is rejected with
//! [`HistoryError::Busy`]. The status returns to `Idle` when the operation
//! completes, fails, or its future is dropped.
//!
//! # Failure policy
//!
//! - A command whose `execute` fails is never recorded.
//! - A command whose `undo` fails stays on top of the undo list and is
//!   reported by [`CommandStack::stuck`] until an undo of it succeeds.
//! - A command whose re-execution fails goes back onto the redo list.
//!
//! Every failure is also sent to the [`Notifier`] as a transient error.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::domain::foundation::{CommandId, StateMachine};
use crate::domain::history::{Command, CommandError, CommandMeta, HistoryError, HistoryStatus};
use crate::ports::{Notification, Notifier};

struct History {
    undo: VecDeque<Box<dyn Command>>,
    redo: Vec<Box<dyn Command>>,
    status: HistoryStatus,
    stuck: Option<CommandId>,
}

pub struct CommandStack {
    history: Mutex<History>,
    max_history_size: usize,
    notifier: Option<Arc<dyn Notifier>>,
}

/// Resets the status to `Idle` when the operation ends, however it ends.
struct Activity<'a> {
    history: &'a Mutex<History>,
}

impl Drop for Activity<'_> {
    fn drop(&mut self) {
        self.history.lock().status = HistoryStatus::Idle;
    }
}

impl CommandStack {
    pub const DEFAULT_MAX_HISTORY: usize = 100;

    /// `max_history_size` is clamped to at least 1.
    pub fn new(max_history_size: usize) -> Self {
        Self {
            history: Mutex::new(History {
                undo: VecDeque::new(),
                redo: Vec::new(),
                status: HistoryStatus::Idle,
                stuck: None,
            }),
            max_history_size: max_history_size.max(1),
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Executes `command` and records it on success.
    ///
    /// Clears the redo list and evicts the oldest entry beyond the history
    /// limit.
    ///
    /// # Errors
    ///
    /// - `HistoryError::Busy` if another operation is in flight
    /// - `HistoryError::Command` if `execute` fails; nothing is recorded
    pub async fn push_command(&self, mut command: Box<dyn Command>) -> Result<CommandMeta, HistoryError> {
        let _activity = self.begin(HistoryStatus::Executing)?;

        if let Err(source) = command.execute().await {
            return Err(self.failed("Action failed", command.meta(), source));
        }

        let meta = command.meta().clone();
        {
            let mut history = self.history.lock();
            history.undo.push_back(command);
            self.evict_overflow(&mut history);
            history.redo.clear();
        }
        tracing::info!(command = %meta.kind, description = %meta.description, "Command executed");
        Ok(meta)
    }

    /// Reverts the most recent command. `Ok(None)` when there is nothing to
    /// undo.
    pub async fn undo(&self) -> Result<Option<CommandMeta>, HistoryError> {
        let activity = self.begin(HistoryStatus::Undoing)?;
        let popped = self.history.lock().undo.pop_back();
        let Some(mut command) = popped else {
            return Ok(None);
        };

        match command.undo().await {
            Ok(()) => {
                let meta = command.meta().clone();
                {
                    let mut history = self.history.lock();
                    if history.stuck == Some(meta.id) {
                        history.stuck = None;
                    }
                    history.redo.push(command);
                }
                drop(activity);
                tracing::info!(command = %meta.kind, description = %meta.description, "Command undone");
                Ok(Some(meta))
            }
            Err(source) => {
                let meta = command.meta().clone();
                {
                    let mut history = self.history.lock();
                    history.stuck = Some(meta.id);
                    history.undo.push_back(command);
                }
                Err(self.failed("Undo failed", &meta, source))
            }
        }
    }

    /// Re-executes the most recently undone command. `Ok(None)` when there
    /// is nothing to redo.
    pub async fn redo(&self) -> Result<Option<CommandMeta>, HistoryError> {
        let activity = self.begin(HistoryStatus::Redoing)?;
        let popped = self.history.lock().redo.pop();
        let Some(mut command) = popped else {
            return Ok(None);
        };

        match command.execute().await {
            Ok(()) => {
                let meta = command.meta().clone();
                {
                    let mut history = self.history.lock();
                    history.undo.push_back(command);
                    self.evict_overflow(&mut history);
                }
                drop(activity);
                tracing::info!(command = %meta.kind, description = %meta.description, "Command redone");
                Ok(Some(meta))
            }
            Err(source) => {
                let meta = command.meta().clone();
                self.history.lock().redo.push(command);
                Err(self.failed("Redo failed", &meta, source))
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        let history = self.history.lock();
        !history.status.is_busy() && !history.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        let history = self.history.lock();
        !history.status.is_busy() && !history.redo.is_empty()
    }

    /// Descriptions on the undo list, most recent first.
    pub fn undo_descriptions(&self) -> Vec<String> {
        self.history
            .lock()
            .undo
            .iter()
            .rev()
            .map(|c| c.description().to_string())
            .collect()
    }

    /// Descriptions on the redo list, next redo first.
    pub fn redo_descriptions(&self) -> Vec<String> {
        self.history
            .lock()
            .redo
            .iter()
            .rev()
            .map(|c| c.description().to_string())
            .collect()
    }

    pub fn undo_len(&self) -> usize {
        self.history.lock().undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.history.lock().redo.len()
    }

    pub fn status(&self) -> HistoryStatus {
        self.history.lock().status
    }

    /// Command whose last undo failed, if it is still on top of the list.
    pub fn stuck(&self) -> Option<CommandId> {
        self.history.lock().stuck
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Forgets both lists.
    ///
    /// # Errors
    ///
    /// `HistoryError::Busy` if an operation is in flight.
    pub fn clear(&self) -> Result<(), HistoryError> {
        let mut history = self.history.lock();
        if history.status.is_busy() {
            return Err(HistoryError::Busy(history.status));
        }
        history.undo.clear();
        history.redo.clear();
        history.stuck = None;
        tracing::debug!("Command history cleared");
        Ok(())
    }

    fn begin(&self, next: HistoryStatus) -> Result<Activity<'_>, HistoryError> {
        let mut history = self.history.lock();
        let current = history.status;
        history.status = current
            .transition_to(next)
            .map_err(|_| HistoryError::Busy(current))?;
        Ok(Activity {
            history: &self.history,
        })
    }

    fn evict_overflow(&self, history: &mut History) {
        while history.undo.len() > self.max_history_size {
            if let Some(evicted) = history.undo.pop_front() {
                if history.stuck == Some(evicted.id()) {
                    history.stuck = None;
                }
                tracing::debug!(description = %evicted.description(), "Evicted oldest command");
            }
        }
    }

    fn failed(&self, title: &str, meta: &CommandMeta, source: CommandError) -> HistoryError {
        tracing::warn!(
            command = %meta.kind,
            description = %meta.description,
            error = %source,
            "{title}"
        );
        if let Some(notifier) = &self.notifier {
            notifier.notify(Notification::error(
                title,
                format!("{}: {}", meta.description, source),
            ));
        }
        HistoryError::Command {
            description: meta.description.clone(),
            source,
        }
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_HISTORY)
    }
}
