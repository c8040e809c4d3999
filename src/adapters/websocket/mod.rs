//! WebSocket adapters for streaming telemetry.
//!
//! - [`tungstenite_transport`] - real `ws://`/`wss://` connections
//! - [`in_memory`] - scripted peers for tests and offline development

pub mod in_memory;
pub mod tungstenite_transport;

pub use in_memory::{InMemoryTransport, PeerHandle};
pub use tungstenite_transport::TungsteniteTransport;
