use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::config::DEFAULT_LOCAL_PREFIX;

use super::table::LocalTable;
use super::{LocalFilter, LocalPage, LocalStore, LocalStoreError};

/// In-memory local store. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryLocalStore {
    prefix: String,
    table: Arc<RwLock<LocalTable>>,
}

impl Default for InMemoryLocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_LOCAL_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            table: Arc::new(RwLock::new(LocalTable::new())),
        }
    }
}

impl LocalStore for InMemoryLocalStore {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn create(&self, content: Vec<u8>) -> Result<String, LocalStoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| LocalStoreError::Poisoned("local write"))?;
        Ok(table.create(&self.prefix, content, SystemTime::now()))
    }

    fn update(&self, id: &str, content: Vec<u8>) -> Result<(), LocalStoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| LocalStoreError::Poisoned("local write"))?;
        table.update(&self.prefix, id, content, SystemTime::now())
    }

    fn read(&self, id: &str) -> Result<Vec<u8>, LocalStoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| LocalStoreError::Poisoned("local read"))?;
        table.read(id)
    }

    fn delete(&self, id: &str) -> Result<(), LocalStoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| LocalStoreError::Poisoned("local write"))?;
        table.delete(id);
        Ok(())
    }

    fn list(&self, filter: &LocalFilter) -> Result<LocalPage, LocalStoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| LocalStoreError::Poisoned("local read"))?;
        Ok(table.list(filter))
    }
}
