//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the sync core to external systems:
//! - `websocket` - streaming transports (tungstenite, in-memory)
//! - `storage` - snapshot persistence (files, in-memory)
//! - `composition` - composition backend (HTTP, in-memory)
//! - `notifications` - user notices (tracing, in-memory)

pub mod composition;
pub mod notifications;
pub mod storage;
pub mod websocket;

pub use composition::{HttpCompositionApi, HttpCompositionConfig, InMemoryCompositionApi};
pub use notifications::{InMemoryNotifier, TracingNotifier};
pub use storage::{FileSnapshotStorage, InMemorySnapshotStorage};
pub use websocket::{InMemoryTransport, PeerHandle, TungsteniteTransport};
