use std::sync::{Arc, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::session::SessionId;

use super::table::DocumentTable;
use super::{Created, DocumentRecord, Snapshot, SnapshotRef, StoreError, VersionStore};

/// In-memory version store backed by `Arc<RwLock<DocumentTable>>`.
///
/// Clone-friendly (cloning shares the same underlying storage). The write
/// lock is held for the whole compare-and-set, which makes conditional writes
/// linearizable per store.
#[derive(Clone)]
pub struct InMemoryVersionStore {
    table: Arc<RwLock<DocumentTable>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Arc::new(RwLock::new(DocumentTable::new())),
            clock,
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::Poisoned("document read"))?;
        Ok(table.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl VersionStore for InMemoryVersionStore {
    fn create(&self, content: Vec<u8>) -> Result<Created, StoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| StoreError::Poisoned("document write"))?;
        Ok(table.create(content, self.clock.now()))
    }

    fn read(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::Poisoned("document read"))?;
        table.read(id)
    }

    fn conditional_write(
        &self,
        id: &str,
        content: Vec<u8>,
        expected_version: Option<u64>,
        writer: Option<&SessionId>,
    ) -> Result<u64, StoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| StoreError::Poisoned("document write"))?;
        table.conditional_write(id, content, expected_version, writer, self.clock.now())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| StoreError::Poisoned("document write"))?;
        table.delete(id);
        Ok(())
    }

    fn snapshot(&self, id: &str, label: Option<&str>) -> Result<SnapshotRef, StoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| StoreError::Poisoned("snapshot write"))?;
        table.snapshot(id, label, self.clock.now())
    }

    fn list_snapshots(&self, id: &str) -> Result<Vec<Snapshot>, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::Poisoned("snapshot read"))?;
        table.list_snapshots(id)
    }

    fn read_snapshot(&self, id: &str, version_number: u64) -> Result<Vec<u8>, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::Poisoned("snapshot read"))?;
        table.read_snapshot(id, version_number)
    }
}
