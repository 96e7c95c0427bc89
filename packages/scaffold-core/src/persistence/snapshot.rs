//! Snapshot file holding every table of an embedded database.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::io_utils::classify_io_error;
use crate::error::ScaffoldError;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot file format.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Format version
    pub version: u32,
    /// Table contents by record type name
    pub tables: BTreeMap<String, TableSnapshot>,
}

/// Contents of one table.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Next auto-generated key
    pub next_id: i64,
    /// Stored field values of every record, in key order
    pub records: Vec<Map<String, Value>>,
}

/// Reads and writes a snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot, or `None` if the file does not exist yet.
    pub fn load(&self) -> Result<Option<SnapshotFile>, ScaffoldError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| classify_io_error(e, "Failed to read snapshot file"))?;

        let snapshot: SnapshotFile = serde_json::from_str(&contents).map_err(|e| {
            ScaffoldError::DataCorruption(format!(
                "Failed to parse snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ScaffoldError::SerializationError(format!(
                "Unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        Ok(Some(snapshot))
    }

    /// Writes the snapshot through a temporary file and an atomic rename.
    pub fn save(&self, snapshot: &SnapshotFile) -> Result<(), ScaffoldError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| ScaffoldError::SerializationError(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let written = write_synced(&temp_path, json.as_bytes()).and_then(|()| {
            fs::rename(&temp_path, &self.path)
                .map_err(|e| classify_io_error(e, "Failed to rename snapshot file"))
        });
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                tracing::warn!("Failed to remove {}: {}", temp_path.display(), cleanup);
            }
            return Err(e);
        }

        tracing::debug!("Snapshot written to {}", self.path.display());
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), ScaffoldError> {
    let mut file =
        File::create(path).map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(bytes)
        .map_err(|e| classify_io_error(e, "Failed to write snapshot"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync snapshot"))
}
