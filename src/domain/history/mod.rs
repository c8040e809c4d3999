//! Undo/redo domain - the command abstraction, history status machine, and
//! errors.

mod command;
mod errors;
mod status;

pub use command::{Command, CommandKind, CommandMeta};
pub use errors::{CommandError, HistoryError};
pub use status::HistoryStatus;
