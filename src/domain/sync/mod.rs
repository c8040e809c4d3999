//! Cross-surface sync domain - envelopes, window lifecycle, hydration rules,
//! and the shared layout state.

mod envelope;
mod hydration;
mod layout;
mod window;

pub use envelope::BroadcastEnvelope;
pub use hydration::{merge_by_id, Identified, PersistedState};
pub use layout::{ClosedTab, LayoutError, LayoutState, LayoutTab, LAYOUT_KEY};
pub use window::{
    WindowKind, WindowLifecycleEvent, WindowRegistry, WindowRegistryEntry, WINDOW_LIFECYCLE_KEY,
};
