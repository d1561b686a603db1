//! DocumentTable - the compare-and-set state machine behind every store.
//!
//! The table holds no locks of its own; callers serialize access (a `RwLock`
//! in the in-memory and file stores) so that each method runs atomically.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::id::base36_id;
use crate::session::SessionId;

use super::{Created, DocumentRecord, Snapshot, SnapshotRef, StoreError};

const ID_LEN: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    content: Vec<u8>,
    version: u64,
    last_modified_by: Option<SessionId>,
    created_at: SystemTime,
    updated_at: SystemTime,
    history: Vec<Snapshot>,
}

impl StoredDocument {
    fn next_snapshot_number(&self) -> u64 {
        self.history
            .last()
            .map(|s| s.version_number + 1)
            .unwrap_or(1)
    }
}

/// All documents of a store, keyed by server-issued id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct DocumentTable {
    documents: HashMap<String, StoredDocument>,
}

impl DocumentTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn create(&mut self, content: Vec<u8>, now: SystemTime) -> Created {
        let mut id = base36_id(ID_LEN);
        while self.documents.contains_key(&id) {
            id = base36_id(ID_LEN);
        }
        self.documents.insert(
            id.clone(),
            StoredDocument {
                content,
                version: 1,
                last_modified_by: None,
                created_at: now,
                updated_at: now,
                history: Vec::new(),
            },
        );
        Created { id, version: 1 }
    }

    pub(crate) fn read(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        let doc = self.get(id)?;
        Ok(DocumentRecord {
            id: id.to_string(),
            content: doc.content.clone(),
            version: doc.version,
            last_modified_by: doc.last_modified_by.clone(),
        })
    }

    pub(crate) fn conditional_write(
        &mut self,
        id: &str,
        content: Vec<u8>,
        expected_version: Option<u64>,
        writer: Option<&SessionId>,
        now: SystemTime,
    ) -> Result<u64, StoreError> {
        let doc = self
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(expected) = expected_version {
            if doc.version != expected {
                return Err(StoreError::VersionConflict {
                    id: id.to_string(),
                    expected,
                    current_version: doc.version,
                    current_content: doc.content.clone(),
                });
            }
        }

        doc.version += 1;
        doc.content = content;
        doc.last_modified_by = writer.cloned();
        doc.updated_at = now;
        Ok(doc.version)
    }

    /// Returns true if the document existed.
    pub(crate) fn delete(&mut self, id: &str) -> bool {
        self.documents.remove(id).is_some()
    }

    pub(crate) fn snapshot(
        &mut self,
        id: &str,
        label: Option<&str>,
        now: SystemTime,
    ) -> Result<SnapshotRef, StoreError> {
        let doc = self
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let version_number = doc.next_snapshot_number();
        doc.history.push(Snapshot {
            version_number,
            document_version: doc.version,
            content: doc.content.clone(),
            committed_at: now,
            label: label.map(str::to_string),
        });

        Ok(SnapshotRef {
            document_id: id.to_string(),
            version_number,
            committed_at: now,
        })
    }

    pub(crate) fn list_snapshots(&self, id: &str) -> Result<Vec<Snapshot>, StoreError> {
        Ok(self.get(id)?.history.clone())
    }

    pub(crate) fn read_snapshot(
        &self,
        id: &str,
        version_number: u64,
    ) -> Result<Vec<u8>, StoreError> {
        let doc = self.get(id)?;
        // History is sorted by construction.
        doc.history
            .binary_search_by_key(&version_number, |s| s.version_number)
            .map(|idx| doc.history[idx].content.clone())
            .map_err(|_| StoreError::SnapshotNotFound {
                id: id.to_string(),
                version_number,
            })
    }

    fn get(&self, id: &str) -> Result<&StoredDocument, StoreError> {
        self.documents
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
