//! Snapshot storage.
//!
//! The latest snapshot is the only state that survives between runs. It sits
//! behind `SnapshotStore` so the merge path can run against `MemoryStore` in
//! tests and `JsonFileStore` in production.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{PriorSnapshot, Snapshot};

mod json_file;
pub mod lock;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt snapshot at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<PriorSnapshot>, StoreError>;

    /// Replaces whatever was stored before.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}
