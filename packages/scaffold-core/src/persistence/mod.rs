//! Snapshot persistence for the embedded engine.

mod io_utils;
mod snapshot;

pub use io_utils::classify_io_error;
pub use snapshot::{SnapshotFile, SnapshotStore, TableSnapshot, SNAPSHOT_VERSION};
