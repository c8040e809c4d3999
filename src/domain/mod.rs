//! Domain layer - pure types and rules, no I/O.

pub mod composition;
pub mod connection;
pub mod foundation;
pub mod history;
pub mod sync;
pub mod telemetry;
