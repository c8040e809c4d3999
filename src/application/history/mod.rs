//! Undo/redo history.

mod command_stack;

pub use command_stack::CommandStack;
