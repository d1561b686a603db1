use std::fmt;

use crate::document::StoreError;
use crate::local::LocalStoreError;
use crate::lock::LockError;
use crate::session::SessionId;

/// Errors surfaced by [`SyncCoordinator`](crate::SyncCoordinator) operations.
///
/// A version conflict on save is reported as
/// [`SaveOutcome::Conflict`](crate::SaveOutcome::Conflict), not as an error;
/// the `VersionConflict` variant here covers the HTTP surface and callers
/// that talk to a [`VersionStore`](crate::VersionStore) through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    NotFound(String),
    /// Another session is editing the document.
    LockHeld {
        document_id: String,
        holder: SessionId,
    },
    NotLockHolder {
        document_id: String,
        holder: SessionId,
    },
    /// The lease expired or was never taken; re-acquire.
    LockNotFound(String),
    VersionConflict {
        document_id: String,
        current_version: u64,
        current_content: Vec<u8>,
    },
    RemoteUnavailable(String),
    Unknown(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotFound(id) => write!(f, "not found: {}", id),
            SyncError::LockHeld {
                document_id,
                holder,
            } => write!(
                f,
                "document {} is being edited by another session ({})",
                document_id, holder
            ),
            SyncError::NotLockHolder {
                document_id,
                holder,
            } => write!(
                f,
                "lock on document {} belongs to {}",
                document_id, holder
            ),
            SyncError::LockNotFound(id) => write!(f, "no live lock on document {}", id),
            SyncError::VersionConflict {
                document_id,
                current_version,
                ..
            } => write!(
                f,
                "document {} was modified concurrently (current version {})",
                document_id, current_version
            ),
            SyncError::RemoteUnavailable(msg) => write!(f, "remote store unavailable: {}", msg),
            SyncError::Unknown(msg) => write!(f, "sync error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

impl SyncError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            SyncError::NotFound(_) => 404,
            SyncError::LockHeld { .. } => 423,
            SyncError::NotLockHolder { .. } => 403,
            SyncError::LockNotFound(_) => 410,
            SyncError::VersionConflict { .. } => 409,
            SyncError::RemoteUnavailable(_) => 503,
            SyncError::Unknown(_) => 500,
        }
    }

    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, SyncError::RemoteUnavailable(_))
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SyncError::NotFound(id),
            StoreError::SnapshotNotFound { id, version_number } => {
                SyncError::NotFound(format!("{} snapshot {}", id, version_number))
            }
            StoreError::VersionConflict {
                id,
                current_version,
                current_content,
                ..
            } => SyncError::VersionConflict {
                document_id: id,
                current_version,
                current_content,
            },
            StoreError::Unavailable(msg) => SyncError::RemoteUnavailable(msg),
            other @ (StoreError::Timeout(_)
            | StoreError::Storage(_)
            | StoreError::Poisoned(_)) => SyncError::Unknown(other.to_string()),
        }
    }
}

impl From<LockError> for SyncError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Held {
                document_id,
                holder,
            } => SyncError::LockHeld {
                document_id,
                holder,
            },
            LockError::NotHolder {
                document_id,
                holder,
            } => SyncError::NotLockHolder {
                document_id,
                holder,
            },
            LockError::NotFound(id) => SyncError::LockNotFound(id),
            LockError::Unavailable(msg) => SyncError::RemoteUnavailable(msg),
            LockError::Poisoned(msg) => SyncError::Unknown(format!("lock poisoned: {}", msg)),
        }
    }
}

impl From<LocalStoreError> for SyncError {
    fn from(err: LocalStoreError) -> Self {
        match err {
            LocalStoreError::NotFound(id) => SyncError::NotFound(id),
            other => SyncError::Unknown(other.to_string()),
        }
    }
}
