//! Concrete reversible commands.
//!
//! Each factory captures what its inverse needs at execution time: old and
//! new values for field edits, full entity snapshots for deletions.

mod clip_commands;
mod layout_commands;
mod tempo_commands;
mod track_commands;

pub use clip_commands::DeleteClipCommand;
pub use layout_commands::{CloseTabCommand, RenameTabCommand};
pub use tempo_commands::SetTempoCommand;
pub use track_commands::{
    CreateTrackCommand, DeleteTrackCommand, RenameTrackCommand, TrackFlagCommand,
    UpdateTrackCommand,
};
