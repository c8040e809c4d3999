//! Tabbed panel layout shared by every surface.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::hydration::{merge_by_id, Identified, PersistedState};
use crate::domain::foundation::WindowId;

/// Bus key carrying full layout states.
pub const LAYOUT_KEY: &str = "layout";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Tab '{0}' not found")]
    TabNotFound(String),

    #[error("Tab '{0}' already exists")]
    DuplicateTab(String),

    #[error("Tab title cannot be empty")]
    EmptyTitle,

    #[error("Tab '{0}' is already popped out")]
    AlreadyPoppedOut(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTab {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub panel_ids: Vec<String>,
}

impl LayoutTab {
    pub fn new(id: impl Into<String>, title: impl Into<String>, panel_ids: &[&str]) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            panel_ids: panel_ids.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A removed tab plus what is needed to put it back exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedTab {
    pub index: usize,
    pub tab: LayoutTab,
    /// Active tab at the moment of closing.
    pub previous_active: Option<String>,
}

impl Identified for LayoutTab {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

/// Tabs, the active tab, and which tabs currently live in popouts.
///
/// `popped_out_tabs` travels over the bus but is ephemeral: it is never
/// written to storage and is cleared on hydration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutState {
    pub tabs: Vec<LayoutTab>,
    pub active_tab: Option<String>,
    #[serde(default)]
    pub popped_out_tabs: BTreeMap<String, WindowId>,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            tabs: vec![
                LayoutTab::new("arrangement", "Arrangement", &["timeline", "transport"]),
                LayoutTab::new("mixer", "Mixer", &["meters", "mixer"]),
                LayoutTab::new("analysis", "Analysis", &["spectrum", "waveform", "analytics"]),
            ],
            active_tab: Some("arrangement".to_string()),
            popped_out_tabs: BTreeMap::new(),
        }
    }
}

impl LayoutState {
    pub fn tab(&self, id: &str) -> Option<&LayoutTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, LayoutError> {
        self.tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| LayoutError::TabNotFound(id.to_string()))
    }

    /// Renames a tab and returns its previous title.
    pub fn rename_tab(&mut self, id: &str, title: &str) -> Result<String, LayoutError> {
        if title.trim().is_empty() {
            return Err(LayoutError::EmptyTitle);
        }
        let index = self.position(id)?;
        Ok(std::mem::replace(
            &mut self.tabs[index].title,
            title.to_string(),
        ))
    }

    pub fn add_tab(&mut self, tab: LayoutTab) -> Result<(), LayoutError> {
        let len = self.tabs.len();
        self.insert_tab(len, tab)
    }

    /// Inserts a tab at `index`, clamped to the end of the list.
    pub fn insert_tab(&mut self, index: usize, tab: LayoutTab) -> Result<(), LayoutError> {
        if self.tab(&tab.id).is_some() {
            return Err(LayoutError::DuplicateTab(tab.id));
        }
        let index = index.min(self.tabs.len());
        self.tabs.insert(index, tab);
        if self.active_tab.is_none() {
            self.active_tab = Some(self.tabs[index].id.clone());
        }
        Ok(())
    }

    /// Removes a tab, returning its former index, contents and the active
    /// tab before removal.
    ///
    /// Closing the active tab activates its neighbour.
    pub fn close_tab(&mut self, id: &str) -> Result<ClosedTab, LayoutError> {
        let index = self.position(id)?;
        let tab = self.tabs.remove(index);
        self.popped_out_tabs.remove(id);
        let previous_active = self.active_tab.clone();

        if previous_active.as_deref() == Some(id) {
            self.active_tab = self
                .tabs
                .get(index)
                .or_else(|| self.tabs.last())
                .map(|t| t.id.clone());
        }
        Ok(ClosedTab {
            index,
            tab,
            previous_active,
        })
    }

    /// Inverse of [`close_tab`](Self::close_tab): reinserts the tab and
    /// reactivates whatever was active when it closed.
    pub fn restore_tab(&mut self, closed: ClosedTab) -> Result<(), LayoutError> {
        self.insert_tab(closed.index, closed.tab)?;
        if let Some(active) = closed.previous_active {
            if self.tab(&active).is_some() {
                self.active_tab = Some(active);
            }
        }
        Ok(())
    }

    pub fn set_active_tab(&mut self, id: &str) -> Result<Option<String>, LayoutError> {
        self.position(id)?;
        Ok(self.active_tab.replace(id.to_string()))
    }

    pub fn pop_out(&mut self, id: &str, window: WindowId) -> Result<(), LayoutError> {
        self.position(id)?;
        if self.popped_out_tabs.contains_key(id) {
            return Err(LayoutError::AlreadyPoppedOut(id.to_string()));
        }
        self.popped_out_tabs.insert(id.to_string(), window);
        Ok(())
    }

    /// Docks every tab hosted by `window`. Returns the docked tab ids.
    pub fn dock_window(&mut self, window: &WindowId) -> Vec<String> {
        let docked: Vec<String> = self
            .popped_out_tabs
            .iter()
            .filter(|(_, w)| *w == window)
            .map(|(tab, _)| tab.clone())
            .collect();
        for tab in &docked {
            self.popped_out_tabs.remove(tab);
        }
        docked
    }

    pub fn is_popped_out(&self, id: &str) -> bool {
        self.popped_out_tabs.contains_key(id)
    }
}

impl PersistedState for LayoutState {
    const NAMESPACE: &'static str = "layout";

    fn merge(persisted: Self, defaults: Self) -> Self {
        let tabs = merge_by_id(persisted.tabs, defaults.tabs);
        let active_tab = persisted
            .active_tab
            .filter(|id| tabs.iter().any(|t| &t.id == id))
            .or_else(|| {
                defaults
                    .active_tab
                    .filter(|id| tabs.iter().any(|t| &t.id == id))
            })
            .or_else(|| tabs.first().map(|t| t.id.clone()));

        Self {
            tabs,
            active_tab,
            popped_out_tabs: persisted.popped_out_tabs,
        }
    }

    fn reset_ephemeral(&mut self) {
        self.popped_out_tabs.clear();
    }
}
