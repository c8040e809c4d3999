//! Window registry and popout lifecycle events.
//!
//! The registry lives only in memory on the main surface. It is rebuilt from
//! `popout-opened` / `popout-closed` events and always starts empty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::WindowId;

/// Bus key on which lifecycle events travel.
pub const WINDOW_LIFECYCLE_KEY: &str = "window-lifecycle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Main,
    Popout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRegistryEntry {
    pub id: WindowId,
    pub kind: WindowKind,
    pub associated_panel_ids: Vec<String>,
}

/// Published whenever a popout opens or closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WindowLifecycleEvent {
    #[serde(rename_all = "camelCase")]
    PopoutOpened {
        window_id: WindowId,
        panel_ids: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    PopoutClosed { window_id: WindowId },
}

impl WindowLifecycleEvent {
    pub fn window_id(&self) -> WindowId {
        match self {
            WindowLifecycleEvent::PopoutOpened { window_id, .. } => *window_id,
            WindowLifecycleEvent::PopoutClosed { window_id } => *window_id,
        }
    }
}

/// Live windows known to the main surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowRegistry {
    entries: BTreeMap<WindowId, WindowRegistryEntry>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: WindowRegistryEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn remove(&mut self, id: &WindowId) -> Option<WindowRegistryEntry> {
        self.entries.remove(id)
    }

    /// Applies a lifecycle event. Returns true when the registry changed.
    pub fn apply(&mut self, event: &WindowLifecycleEvent) -> bool {
        match event {
            WindowLifecycleEvent::PopoutOpened {
                window_id,
                panel_ids,
            } => {
                let entry = WindowRegistryEntry {
                    id: *window_id,
                    kind: WindowKind::Popout,
                    associated_panel_ids: panel_ids.clone(),
                };
                self.entries.insert(*window_id, entry.clone()) != Some(entry)
            }
            WindowLifecycleEvent::PopoutClosed { window_id } => {
                self.entries.remove(window_id).is_some()
            }
        }
    }

    pub fn get(&self, id: &WindowId) -> Option<&WindowRegistryEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &WindowId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn popouts(&self) -> impl Iterator<Item = &WindowRegistryEntry> {
        self.entries
            .values()
            .filter(|e| e.kind == WindowKind::Popout)
    }

    pub fn popout_count(&self) -> usize {
        self.popouts().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
