//! FileVersionStore - durable version store persisted as one bitcode image.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::persist::replace_file;
use crate::session::SessionId;

use super::table::DocumentTable;
use super::{Created, DocumentRecord, Snapshot, SnapshotRef, StoreError, VersionStore};

/// Version store that rewrites its whole table to disk after every mutation.
///
/// The image is written to a sibling temp file and renamed into place, so a
/// crash mid-write leaves the previous image intact. The in-memory table is
/// only updated once the new image is on disk.
#[derive(Clone)]
pub struct FileVersionStore {
    path: PathBuf,
    table: Arc<RwLock<DocumentTable>>,
    clock: Arc<dyn Clock>,
}

impl FileVersionStore {
    /// Open (or start) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let table = match fs::read(&path) {
            Ok(bytes) => bitcode::deserialize::<DocumentTable>(&bytes)
                .map_err(|e| StoreError::Storage(format!("decode {}: {e}", path.display())))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentTable::new(),
            Err(e) => return Err(io_error(&path, e)),
        };
        Ok(Self {
            path,
            table: Arc::new(RwLock::new(table)),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy of the table, persist the copy, then publish it.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut DocumentTable) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| StoreError::Poisoned("document write"))?;
        let mut next = table.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *table = next;
        Ok(out)
    }

    fn persist(&self, table: &DocumentTable) -> Result<(), StoreError> {
        let bytes = bitcode::serialize(table)
            .map_err(|e| StoreError::Storage(format!("encode: {e}")))?;
        replace_file(&self.path, &bytes).map_err(|(path, e)| io_error(&path, e))
    }

    fn read_table<T>(
        &self,
        f: impl FnOnce(&DocumentTable) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::Poisoned("document read"))?;
        f(&table)
    }
}

fn io_error(path: &Path, e: io::Error) -> StoreError {
    StoreError::Storage(format!("{}: {}", path.display(), e))
}

impl VersionStore for FileVersionStore {
    fn create(&self, content: Vec<u8>) -> Result<Created, StoreError> {
        let now = self.clock.now();
        self.mutate(|table| Ok(table.create(content, now)))
    }

    fn read(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        self.read_table(|table| table.read(id))
    }

    fn conditional_write(
        &self,
        id: &str,
        content: Vec<u8>,
        expected_version: Option<u64>,
        writer: Option<&SessionId>,
    ) -> Result<u64, StoreError> {
        let now = self.clock.now();
        self.mutate(|table| table.conditional_write(id, content, expected_version, writer, now))
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let exists = self.read_table(|table| Ok(table.read(id).is_ok()))?;
        if !exists {
            return Ok(());
        }
        self.mutate(|table| {
            table.delete(id);
            Ok(())
        })
    }

    fn snapshot(&self, id: &str, label: Option<&str>) -> Result<SnapshotRef, StoreError> {
        let now = self.clock.now();
        self.mutate(|table| table.snapshot(id, label, now))
    }

    fn list_snapshots(&self, id: &str) -> Result<Vec<Snapshot>, StoreError> {
        self.read_table(|table| table.list_snapshots(id))
    }

    fn read_snapshot(&self, id: &str, version_number: u64) -> Result<Vec<u8>, StoreError> {
        self.read_table(|table| table.read_snapshot(id, version_number))
    }
}
