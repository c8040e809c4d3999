//! Storage Adapters
//!
//! Implementations of the SnapshotStorage port for persisting hydrated state.
//!
//! ## Available Adapters
//!
//! - **FileSnapshotStorage** - Stores snapshots as JSON files on disk
//! - **InMemorySnapshotStorage** - Stores snapshots in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSnapshotStorage, InMemorySnapshotStorage};
//!
//! // Production: file-based storage
//! let storage = FileSnapshotStorage::new("./data/snapshots");
//!
//! // Testing: in-memory storage
//! let storage = InMemorySnapshotStorage::new();
//! ```

mod file_snapshot_storage;
mod in_memory_snapshot_storage;

pub use file_snapshot_storage::FileSnapshotStorage;
pub use in_memory_snapshot_storage::InMemorySnapshotStorage;
