//! Application layer - socket clients, feeds, cross-window sync and history.
//!
//! This layer orchestrates domain types over the ports; adapters are
//! injected through [`context::SyncDependencies`].

pub mod commands;
pub mod connection_registry;
pub mod context;
pub mod handler_set;
pub mod history;
pub mod socket_client;
pub mod sync;
pub mod telemetry;

pub use connection_registry::ConnectionRegistry;
pub use context::{SyncContext, SyncDependencies, SyncOptions};
pub use handler_set::{HandlerSet, Subscription};
pub use history::CommandStack;
pub use socket_client::{ConnectionOptions, SocketClient};
pub use sync::{CrossWindowBus, LayoutStore, SnapshotStore, Surface, WindowTracker};
pub use telemetry::TelemetryFeeds;
