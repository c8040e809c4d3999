//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the sync core and the outside world. Adapters implement these ports.
//!
//! - `SocketTransport` - opens streaming telemetry connections
//! - `SnapshotStorage` - namespaced persistence for hydrated state
//! - `CompositionApi` - the track/clip/tempo backend commands mutate
//! - `Notifier` - transient notices for failed commands

mod composition_api;
mod notifier;
mod snapshot_storage;
mod socket_transport;

pub use composition_api::{ApiError, CompositionApi};
pub use notifier::{Notification, NotificationLevel, Notifier};
pub use snapshot_storage::{SnapshotStorage, StorageError};
pub use socket_transport::{InboundFrame, OutboundFrame, SocketChannel, SocketTransport};
