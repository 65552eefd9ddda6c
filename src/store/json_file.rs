use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::models::{PriorSnapshot, Snapshot};
use crate::store::{SnapshotStore, StoreError};

/// Stores the snapshot as pretty-printed JSON at a fixed path.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl SnapshotStore for JsonFileStore {
    /// Fields are read one by one; only a file that is not a JSON object is
    /// reported as corrupt.
    fn load(&self) -> Result<Option<PriorSnapshot>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let value: Value = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        PriorSnapshot::from_value(&value)
            .map(Some)
            .ok_or_else(|| StoreError::Corrupt {
                path: self.path.clone(),
                source: serde::de::Error::custom("expected a JSON object"),
            })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let body = serde_json::to_vec_pretty(snapshot)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&body).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!("Persisted snapshot ({} bytes) to {}", body.len(), self.path.display());
        Ok(())
    }
}
