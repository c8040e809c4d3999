//! Window registry maintained by the main surface.

use parking_lot::Mutex;
use std::sync::Arc;

use super::cross_window_bus::Surface;
use crate::application::handler_set::{HandlerSet, Subscription};
use crate::domain::sync::{
    WindowLifecycleEvent, WindowRegistry, WindowRegistryEntry, WINDOW_LIFECYCLE_KEY,
};

/// Keeps the in-memory [`WindowRegistry`] in step with popout lifecycle
/// events. Never persisted; a fresh tracker knows only the main window.
pub struct WindowTracker {
    registry: Arc<Mutex<WindowRegistry>>,
    changes: HandlerSet<WindowRegistry>,
    subscription: Mutex<Option<Subscription>>,
}

impl WindowTracker {
    pub fn attach(main: &Surface) -> Self {
        if !main.is_main() {
            tracing::warn!(surface = %main.id(), "Window tracker attached to a popout surface");
        }

        let mut initial = WindowRegistry::new();
        initial.register(WindowRegistryEntry {
            id: main.window_id(),
            kind: main.kind(),
            associated_panel_ids: main.panel_ids().to_vec(),
        });
        let registry = Arc::new(Mutex::new(initial));
        let changes = HandlerSet::new();

        let shared = Arc::clone(&registry);
        let notify = changes.clone();
        let subscription = main.subscribe(WINDOW_LIFECYCLE_KEY, move |event: WindowLifecycleEvent| {
            let snapshot = {
                let mut registry = shared.lock();
                if !registry.apply(&event) {
                    return;
                }
                registry.clone()
            };
            tracing::info!(
                window = %event.window_id(),
                popouts = snapshot.popout_count(),
                "Window registry updated"
            );
            notify.emit(&snapshot);
        });

        Self {
            registry,
            changes,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub fn snapshot(&self) -> WindowRegistry {
        self.registry.lock().clone()
    }

    pub fn popouts(&self) -> Vec<WindowRegistryEntry> {
        self.registry.lock().popouts().cloned().collect()
    }

    pub fn popout_count(&self) -> usize {
        self.registry.lock().popout_count()
    }

    pub fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&WindowRegistry) + Send + Sync + 'static,
    {
        self.changes.add(handler)
    }

    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
        }
    }
}
