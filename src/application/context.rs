//! Wiring for one studio client: a connection registry, the cross-window
//! bus with its main surface, persisted layout, and undo history.

use std::sync::Arc;

use crate::adapters::{
    FileSnapshotStorage, HttpCompositionApi, TracingNotifier, TungsteniteTransport,
};
use crate::application::connection_registry::ConnectionRegistry;
use crate::application::history::CommandStack;
use crate::application::sync::{CrossWindowBus, LayoutStore, SnapshotStore, Surface, WindowTracker};
use crate::application::telemetry::TelemetryFeeds;
use crate::config::AppConfig;
use crate::domain::connection::ReconnectPolicy;
use crate::ports::{ApiError, CompositionApi, Notifier, SnapshotStorage, SocketTransport};

/// Ports a context is built from.
#[derive(Clone)]
pub struct SyncDependencies {
    pub transport: Arc<dyn SocketTransport>,
    pub storage: Arc<dyn SnapshotStorage>,
    pub composition: Arc<dyn CompositionApi>,
    pub notifier: Arc<dyn Notifier>,
}

/// Tunables that do not come from ports.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub socket_base_url: String,
    pub reconnect: ReconnectPolicy,
    pub namespace: String,
    pub max_history: usize,
    pub bus_capacity: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            socket_base_url: "ws://localhost:8000".to_string(),
            reconnect: ReconnectPolicy::default(),
            namespace: SnapshotStore::DEFAULT_PREFIX.to_string(),
            max_history: CommandStack::DEFAULT_MAX_HISTORY,
            bus_capacity: CrossWindowBus::DEFAULT_CAPACITY,
        }
    }
}

pub struct SyncContext {
    pub registry: ConnectionRegistry,
    pub bus: CrossWindowBus,
    pub main: Surface,
    pub windows: WindowTracker,
    pub snapshots: Arc<SnapshotStore>,
    pub layout: Arc<LayoutStore>,
    pub history: CommandStack,
    pub composition: Arc<dyn CompositionApi>,
    options: SyncOptions,
}

impl SyncContext {
    /// Builds the context and hydrates the main surface's layout.
    pub async fn new(deps: SyncDependencies, options: SyncOptions) -> Self {
        let registry = ConnectionRegistry::new(deps.transport);
        let bus = CrossWindowBus::new(options.bus_capacity);
        let main = bus.attach_main();
        let windows = WindowTracker::attach(&main);
        let snapshots = Arc::new(SnapshotStore::new(deps.storage, options.namespace.clone()));
        let layout = LayoutStore::hydrate(main.clone(), Arc::clone(&snapshots)).await;
        let history = CommandStack::new(options.max_history).with_notifier(deps.notifier);

        tracing::debug!(
            surface = %main.id(),
            namespace = %options.namespace,
            "Sync context ready"
        );

        Self {
            registry,
            bus,
            main,
            windows,
            snapshots,
            layout,
            history,
            composition: deps.composition,
            options,
        }
    }

    /// Production wiring: tungstenite sockets, file snapshots, HTTP backend.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let composition = HttpCompositionApi::new(config.api.http_config())?;
        let deps = SyncDependencies {
            transport: Arc::new(TungsteniteTransport::new()),
            storage: Arc::new(FileSnapshotStorage::new(&config.storage.directory)),
            composition: Arc::new(composition),
            notifier: Arc::new(TracingNotifier::new()),
        };
        let options = SyncOptions {
            socket_base_url: config.socket.base_url.clone(),
            reconnect: config.socket.reconnect_policy(),
            namespace: config.storage.namespace.clone(),
            max_history: config.history.max_size,
            bus_capacity: config.history.bus_capacity,
        };
        Ok(Self::new(deps, options).await)
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Opens all five telemetry feeds against the configured base URL.
    pub fn open_feeds(&self) -> TelemetryFeeds {
        TelemetryFeeds::open(
            &self.registry,
            &self.options.socket_base_url,
            self.options.reconnect.clone(),
        )
    }

    /// Detaches local listeners and drops every socket.
    pub fn shutdown(&self) {
        self.layout.detach();
        self.windows.detach();
        self.main.close();
        self.registry.disconnect_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryCompositionApi, InMemoryNotifier, InMemorySnapshotStorage, InMemoryTransport,
    };
    use crate::domain::connection::ConnectionState;
    use std::time::Duration;

    fn in_memory() -> (SyncDependencies, InMemoryTransport, InMemorySnapshotStorage) {
        let transport = InMemoryTransport::new();
        let storage = InMemorySnapshotStorage::new();
        let deps = SyncDependencies {
            transport: Arc::new(transport.clone()),
            storage: Arc::new(storage.clone()),
            composition: Arc::new(InMemoryCompositionApi::new()),
            notifier: Arc::new(InMemoryNotifier::new()),
        };
        (deps, transport, storage)
    }

    #[tokio::test(start_paused = true)]
    async fn feeds_share_the_context_registry() {
        let (deps, transport, _) = in_memory();
        let context = SyncContext::new(deps, SyncOptions::default()).await;

        let feeds = context.open_feeds();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(context.registry.len(), 5);
        assert_eq!(transport.attempts(), 5);
        assert!(transport
            .opened_urls()
            .iter()
            .all(|url| url.starts_with("ws://localhost:8000/")));
        assert_eq!(feeds.connected_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_disconnects_everything() {
        let (deps, _transport, _) = in_memory();
        let context = SyncContext::new(deps, SyncOptions::default()).await;
        let feeds = context.open_feeds();

        context.shutdown();
        feeds.close(&context.registry);

        assert!(context.registry.is_empty());
        assert!(context.main.is_closed());
        assert_eq!(
            feeds.spectrum.client().state(),
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn layout_edits_are_persisted_under_namespace() {
        let (deps, _transport, storage) = in_memory();
        let options = SyncOptions {
            namespace: "session-a".into(),
            ..SyncOptions::default()
        };
        let context = SyncContext::new(deps, options).await;

        context.layout.rename_tab("mixer", "Desk").await.unwrap();

        assert!(storage.raw("session-a.layout").await.is_some());
    }
}
