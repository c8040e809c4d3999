//! Local, undoable layout edits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::sync::LayoutStore;
use crate::domain::history::{Command, CommandError, CommandKind, CommandMeta};
use crate::domain::sync::{ClosedTab, LayoutError};

fn rejected(err: LayoutError) -> CommandError {
    CommandError::Rejected(err.to_string())
}

pub struct RenameTabCommand {
    meta: CommandMeta,
    layout: Arc<LayoutStore>,
    tab_id: String,
    title: String,
    previous: Option<String>,
}

impl RenameTabCommand {
    pub fn new(layout: Arc<LayoutStore>, tab_id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            meta: CommandMeta::new(CommandKind::RenameTab, format!("Rename tab to '{title}'")),
            layout,
            tab_id: tab_id.into(),
            title,
            previous: None,
        }
    }
}

#[async_trait]
impl Command for RenameTabCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        let previous = self
            .layout
            .rename_tab(&self.tab_id, &self.title)
            .await
            .map_err(rejected)?;
        self.previous = Some(previous);
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let previous = self.previous.as_deref().ok_or(CommandError::NotExecuted)?;
        self.layout
            .rename_tab(&self.tab_id, previous)
            .await
            .map_err(rejected)?;
        Ok(())
    }
}

/// Closes a tab; undo puts it back at its former position and reactivates
/// whichever tab was active before.
pub struct CloseTabCommand {
    meta: CommandMeta,
    layout: Arc<LayoutStore>,
    tab_id: String,
    closed: Option<ClosedTab>,
}

impl CloseTabCommand {
    pub fn new(layout: Arc<LayoutStore>, tab_id: impl Into<String>) -> Self {
        let tab_id = tab_id.into();
        Self {
            meta: CommandMeta::new(CommandKind::CloseTab, format!("Close tab '{tab_id}'")),
            layout,
            tab_id,
            closed: None,
        }
    }
}

#[async_trait]
impl Command for CloseTabCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        let closed = self.layout.close_tab(&self.tab_id).await.map_err(rejected)?;
        self.closed = Some(closed);
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let closed = self.closed.clone().ok_or(CommandError::NotExecuted)?;
        self.layout.restore_tab(closed).await.map_err(rejected)?;
        self.closed = None;
        Ok(())
    }
}
