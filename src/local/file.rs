//! FileLocalStore - local documents kept in a single JSON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::config::DEFAULT_LOCAL_PREFIX;
use crate::persist::replace_file;

use super::table::LocalTable;
use super::{LocalFilter, LocalPage, LocalStore, LocalStoreError};

/// Local store persisted as a JSON array of documents.
///
/// The file is rewritten after every mutation; the in-memory copy is only
/// replaced once the write succeeded.
#[derive(Clone)]
pub struct FileLocalStore {
    path: PathBuf,
    prefix: String,
    table: Arc<RwLock<LocalTable>>,
}

impl FileLocalStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LocalStoreError> {
        Self::open_with_prefix(path, DEFAULT_LOCAL_PREFIX)
    }

    pub fn open_with_prefix(
        path: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Result<Self, LocalStoreError> {
        let path = path.into();
        let table = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| LocalStoreError::Serde(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => LocalTable::new(),
            Err(e) => return Err(io_error(&path, e)),
        };
        Ok(Self {
            path,
            prefix: prefix.into(),
            table: Arc::new(RwLock::new(table)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut LocalTable) -> Result<T, LocalStoreError>,
    ) -> Result<T, LocalStoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| LocalStoreError::Poisoned("local write"))?;
        let mut next = table.clone();
        let out = f(&mut next)?;

        let bytes =
            serde_json::to_vec_pretty(&next).map_err(|e| LocalStoreError::Serde(e.to_string()))?;
        replace_file(&self.path, &bytes).map_err(|(path, e)| io_error(&path, e))?;

        *table = next;
        Ok(out)
    }

    fn read_table<T>(&self, f: impl FnOnce(&LocalTable) -> T) -> Result<T, LocalStoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| LocalStoreError::Poisoned("local read"))?;
        Ok(f(&table))
    }
}

fn io_error(path: &Path, e: io::Error) -> LocalStoreError {
    LocalStoreError::Io(format!("{}: {}", path.display(), e))
}

impl LocalStore for FileLocalStore {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn create(&self, content: Vec<u8>) -> Result<String, LocalStoreError> {
        let now = SystemTime::now();
        self.mutate(|table| Ok(table.create(&self.prefix, content, now)))
    }

    fn update(&self, id: &str, content: Vec<u8>) -> Result<(), LocalStoreError> {
        let now = SystemTime::now();
        self.mutate(|table| table.update(&self.prefix, id, content, now))
    }

    fn read(&self, id: &str) -> Result<Vec<u8>, LocalStoreError> {
        self.read_table(|table| table.read(id))?
    }

    fn delete(&self, id: &str) -> Result<(), LocalStoreError> {
        if self.read_table(|table| table.read(id).is_err())? {
            return Ok(());
        }
        self.mutate(|table| {
            table.delete(id);
            Ok(())
        })
    }

    fn list(&self, filter: &LocalFilter) -> Result<LocalPage, LocalStoreError> {
        self.read_table(|table| table.list(filter))
    }
}
