//! Pooled socket clients, one per endpoint.
//!
//! # Architecture
//!
//! ```text
//! ConnectionRegistry
//! ├── spectrum  → SocketClient ──┐
//! ├── meters    → SocketClient ──┼── SocketTransport
//! └── transport → SocketClient ──┘
//! ```
//!
//! Every consumer of an endpoint shares the same client, so two feeds asking
//! for `meters` never open two sockets.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::socket_client::{ConnectionOptions, SocketClient};
use crate::domain::connection::HealthStatus;
use crate::domain::foundation::EndpointKey;
use crate::ports::SocketTransport;

/// Owns every live [`SocketClient`], keyed by endpoint.
///
/// Only the registry creates or removes entries.
pub struct ConnectionRegistry {
    transport: Arc<dyn SocketTransport>,
    clients: Mutex<HashMap<EndpointKey, SocketClient>>,
}

impl ConnectionRegistry {
    pub fn new(transport: Arc<dyn SocketTransport>) -> Self {
        Self {
            transport,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pooled client for `endpoint`, creating and connecting it
    /// on first use.
    ///
    /// `options` only apply when the client is created; an existing client
    /// keeps the options it was created with.
    pub fn get_connection(&self, endpoint: &EndpointKey, options: ConnectionOptions) -> SocketClient {
        let (client, created) = {
            let mut clients = self.clients.lock();
            match clients.get(endpoint) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let client =
                        SocketClient::new(endpoint.clone(), options, Arc::clone(&self.transport));
                    clients.insert(endpoint.clone(), client.clone());
                    (client, true)
                }
            }
        };

        if created {
            tracing::info!(endpoint = %endpoint, url = %client.url(), "Opening pooled connection");
            client.connect();
        }
        client
    }

    /// Pooled client for `endpoint`, if any.
    pub fn get(&self, endpoint: &EndpointKey) -> Option<SocketClient> {
        self.clients.lock().get(endpoint).cloned()
    }

    /// Tears down and forgets the client for `endpoint`.
    ///
    /// Returns `false` when no client was registered.
    pub fn disconnect(&self, endpoint: &EndpointKey) -> bool {
        let removed = self.clients.lock().remove(endpoint);
        match removed {
            Some(client) => {
                client.disconnect();
                true
            }
            None => false,
        }
    }

    /// Shutdown: disconnects and removes every client.
    pub fn disconnect_all(&self) {
        let drained: Vec<SocketClient> = self.clients.lock().drain().map(|(_, c)| c).collect();
        tracing::info!(count = drained.len(), "Disconnecting all pooled connections");
        for client in drained {
            client.disconnect();
        }
    }

    /// Counts of pooled clients per connection state.
    pub fn health_status(&self) -> HealthStatus {
        let clients: Vec<SocketClient> = self.clients.lock().values().cloned().collect();
        HealthStatus::from_states(clients.iter().map(SocketClient::state))
    }

    /// Live endpoint keys in sorted order.
    pub fn endpoints(&self) -> Vec<EndpointKey> {
        let mut keys: Vec<EndpointKey> = self.clients.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
