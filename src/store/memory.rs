use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::{PriorSnapshot, Snapshot};
use crate::store::{SnapshotStore, StoreError};

/// In-process store. Cloning shares the same slot.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot))),
        }
    }

    pub fn current(&self) -> Option<Snapshot> {
        self.slot.lock().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<PriorSnapshot>, StoreError> {
        Ok(self.slot.lock().clone().map(PriorSnapshot::from))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }
}
