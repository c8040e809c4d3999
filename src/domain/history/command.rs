//! Reversible command abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::CommandError;
use crate::domain::foundation::{CommandId, Timestamp};

/// Type tag for every command family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    CreateTrack,
    DeleteTrack,
    RenameTrack,
    UpdateTrack,
    MuteTrack,
    SoloTrack,
    SetTempo,
    DeleteClip,
    RenameTab,
    CloseTab,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateTrack => "create_track",
            CommandKind::DeleteTrack => "delete_track",
            CommandKind::RenameTrack => "rename_track",
            CommandKind::UpdateTrack => "update_track",
            CommandKind::MuteTrack => "mute_track",
            CommandKind::SoloTrack => "solo_track",
            CommandKind::SetTempo => "set_tempo",
            CommandKind::DeleteClip => "delete_clip",
            CommandKind::RenameTab => "rename_tab",
            CommandKind::CloseTab => "close_tab",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and display data shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMeta {
    pub id: CommandId,
    pub kind: CommandKind,
    pub description: String,
    pub timestamp: Timestamp,
}

impl CommandMeta {
    /// Stamps a new command created at the moment of the user action.
    pub fn new(kind: CommandKind, description: impl Into<String>) -> Self {
        Self {
            id: CommandId::new(),
            kind,
            description: description.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// A user mutation paired with its inverse.
///
/// `execute` followed by `undo` must leave observable state unchanged.
/// Commands may record data during `execute` (a snapshot, a server-assigned
/// id) that `undo` later needs, hence `&mut self`.
#[async_trait]
pub trait Command: Send {
    fn meta(&self) -> &CommandMeta;

    async fn execute(&mut self) -> Result<(), CommandError>;

    async fn undo(&mut self) -> Result<(), CommandError>;

    fn id(&self) -> CommandId {
        self.meta().id
    }

    fn kind(&self) -> CommandKind {
        self.meta().kind
    }

    fn description(&self) -> &str {
        &self.meta().description
    }
}
