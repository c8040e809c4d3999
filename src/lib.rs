//! Studio Sync - client-side synchronization core for a multi-surface studio.
//!
//! Keeps pooled telemetry sockets alive with backoff, reduces their frames
//! into last-value feeds, mirrors state between the main window and popped
//! out surfaces, and tracks undoable edits against the composition backend.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
