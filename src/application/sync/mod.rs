//! Cross-surface synchronization - the bus, window tracking, snapshot
//! hydration, and the mirrored layout store.

mod cross_window_bus;
mod layout_store;
mod snapshot_store;
mod window_tracker;

pub use cross_window_bus::{BusError, CrossWindowBus, Surface};
pub use layout_store::LayoutStore;
pub use snapshot_store::SnapshotStore;
pub use window_tracker::WindowTracker;
