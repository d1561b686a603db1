use crate::session::SessionId;

use super::{Created, DocumentRecord, Snapshot, SnapshotRef, StoreError};

/// Durable store of versioned documents and their snapshot history.
///
/// Every method is a potentially slow remote call. Implementations must make
/// [`conditional_write`](VersionStore::conditional_write) a single indivisible
/// compare-and-set per document: of two writers presenting the same
/// `expected_version`, at most one succeeds.
pub trait VersionStore: Send + Sync {
    /// Store a new document at version 1 under a server-issued id.
    fn create(&self, content: Vec<u8>) -> Result<Created, StoreError>;

    /// Read current content, version and last writer.
    fn read(&self, id: &str) -> Result<DocumentRecord, StoreError>;

    /// Replace content if the stored version equals `expected_version`.
    ///
    /// Returns the new version (`expected_version + 1`). On mismatch fails with
    /// [`StoreError::VersionConflict`] carrying the current version and content,
    /// and mutates nothing. `None` skips the check (last writer wins).
    fn conditional_write(
        &self,
        id: &str,
        content: Vec<u8>,
        expected_version: Option<u64>,
        writer: Option<&SessionId>,
    ) -> Result<u64, StoreError>;

    /// Remove a document and its history. Removing a missing document is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Capture the current content under the next snapshot number.
    fn snapshot(&self, id: &str, label: Option<&str>) -> Result<SnapshotRef, StoreError>;

    /// All snapshots of a document, oldest first.
    fn list_snapshots(&self, id: &str) -> Result<Vec<Snapshot>, StoreError>;

    /// Content captured by snapshot `version_number`.
    fn read_snapshot(&self, id: &str, version_number: u64) -> Result<Vec<u8>, StoreError>;
}

impl<S: VersionStore + ?Sized> VersionStore for std::sync::Arc<S> {
    fn create(&self, content: Vec<u8>) -> Result<Created, StoreError> {
        (**self).create(content)
    }

    fn read(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        (**self).read(id)
    }

    fn conditional_write(
        &self,
        id: &str,
        content: Vec<u8>,
        expected_version: Option<u64>,
        writer: Option<&SessionId>,
    ) -> Result<u64, StoreError> {
        (**self).conditional_write(id, content, expected_version, writer)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn snapshot(&self, id: &str, label: Option<&str>) -> Result<SnapshotRef, StoreError> {
        (**self).snapshot(id, label)
    }

    fn list_snapshots(&self, id: &str) -> Result<Vec<Snapshot>, StoreError> {
        (**self).list_snapshots(id)
    }

    fn read_snapshot(&self, id: &str, version_number: u64) -> Result<Vec<u8>, StoreError> {
        (**self).read_snapshot(id, version_number)
    }
}
