//! Tab layout mirrored across surfaces.
//!
//! Each surface holds its own `LayoutStore`. A local mutation updates the
//! local state, publishes the full state on [`LAYOUT_KEY`] and persists the
//! non-ephemeral part. Remote states replace the local one without being
//! re-published, so updates never bounce between surfaces.

use parking_lot::Mutex;
use std::sync::Arc;

use super::cross_window_bus::{CrossWindowBus, Surface};
use super::snapshot_store::SnapshotStore;
use crate::application::handler_set::{HandlerSet, Subscription};
use crate::domain::sync::{
    ClosedTab, LayoutError, LayoutState, LayoutTab, WindowLifecycleEvent, LAYOUT_KEY, WINDOW_LIFECYCLE_KEY,
};

pub struct LayoutStore {
    surface: Surface,
    snapshots: Arc<SnapshotStore>,
    state: Arc<Mutex<LayoutState>>,
    changes: HandlerSet<LayoutState>,
    subscription: Mutex<Option<Subscription>>,
}

impl LayoutStore {
    /// Loads the persisted layout for `surface` and starts following remote
    /// updates and popout closures.
    pub async fn hydrate(surface: Surface, snapshots: Arc<SnapshotStore>) -> Arc<Self> {
        let initial: LayoutState = snapshots.hydrate().await;
        let state = Arc::new(Mutex::new(initial));
        let changes = HandlerSet::new();

        let remote_state = Arc::clone(&state);
        let remote_changes = changes.clone();
        let on_remote = surface.subscribe(LAYOUT_KEY, move |mut remote: LayoutState| {
            {
                let mut state = remote_state.lock();
                // Popout records are only dropped by a local PopoutClosed.
                for (tab, window) in &state.popped_out_tabs {
                    remote.popped_out_tabs.entry(tab.clone()).or_insert(*window);
                }
                *state = remote.clone();
            }
            remote_changes.emit(&remote);
        });

        let lifecycle_state = Arc::clone(&state);
        let lifecycle_changes = changes.clone();
        let on_lifecycle = surface.subscribe(WINDOW_LIFECYCLE_KEY, move |event: WindowLifecycleEvent| {
            let WindowLifecycleEvent::PopoutClosed { window_id } = event else {
                return;
            };
            let docked = {
                let mut state = lifecycle_state.lock();
                let docked = state.dock_window(&window_id);
                (!docked.is_empty()).then(|| (docked, state.clone()))
            };
            if let Some((tabs, snapshot)) = docked {
                tracing::info!(window = %window_id, ?tabs, "Docked tabs from closed popout");
                lifecycle_changes.emit(&snapshot);
            }
        });

        Arc::new(Self {
            surface,
            snapshots,
            state,
            changes,
            subscription: Mutex::new(Some(Subscription::merge(vec![on_remote, on_lifecycle]))),
        })
    }

    pub fn state(&self) -> LayoutState {
        self.state.lock().clone()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Renames a tab and returns its previous title.
    pub async fn rename_tab(&self, id: &str, title: &str) -> Result<String, LayoutError> {
        self.mutate(|s| s.rename_tab(id, title)).await
    }

    /// Closes a tab and returns what `restore_tab` needs to undo it.
    pub async fn close_tab(&self, id: &str) -> Result<ClosedTab, LayoutError> {
        self.mutate(|s| s.close_tab(id)).await
    }

    /// Puts a closed tab back at its index and reactivates the tab that was
    /// active when it closed.
    pub async fn restore_tab(&self, closed: ClosedTab) -> Result<(), LayoutError> {
        self.mutate(|s| s.restore_tab(closed)).await
    }

    pub async fn add_tab(&self, tab: LayoutTab) -> Result<(), LayoutError> {
        self.mutate(|s| s.add_tab(tab)).await
    }

    pub async fn set_active_tab(&self, id: &str) -> Result<Option<String>, LayoutError> {
        self.mutate(|s| s.set_active_tab(id)).await
    }

    /// Opens a popout hosting the tab's panels and records the tab as popped
    /// out. The tab docks again when the popout closes.
    pub async fn pop_out_tab(&self, bus: &CrossWindowBus, id: &str) -> Result<Surface, LayoutError> {
        let panel_ids = {
            let state = self.state.lock();
            let tab = state
                .tab(id)
                .ok_or_else(|| LayoutError::TabNotFound(id.to_string()))?;
            if state.is_popped_out(id) {
                return Err(LayoutError::AlreadyPoppedOut(id.to_string()));
            }
            tab.panel_ids.clone()
        };

        let popout = bus.open_popout(panel_ids);
        let window = popout.window_id();
        if let Err(e) = self.mutate(|s| s.pop_out(id, window)).await {
            popout.close();
            return Err(e);
        }
        Ok(popout)
    }

    pub fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&LayoutState) + Send + Sync + 'static,
    {
        self.changes.add(handler)
    }

    /// Stops following remote updates.
    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
        }
    }

    async fn mutate<R>(
        &self,
        change: impl FnOnce(&mut LayoutState) -> Result<R, LayoutError>,
    ) -> Result<R, LayoutError> {
        let (result, snapshot) = {
            let mut state = self.state.lock();
            let result = change(&mut state)?;
            let snapshot = state.clone();
            // Published under the lock so local mutation order is bus order.
            if let Err(e) = self.surface.publish(LAYOUT_KEY, &snapshot) {
                tracing::warn!(surface = %self.surface.id(), error = %e, "Layout not published");
            }
            (result, snapshot)
        };

        self.changes.emit(&snapshot);
        self.snapshots.persist(&snapshot).await;
        Ok(result)
    }
}
