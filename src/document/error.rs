use std::fmt;

/// Error type for version store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No document with this id.
    NotFound(String),
    /// The document exists but has no snapshot with this number.
    SnapshotNotFound { id: String, version_number: u64 },
    /// Optimistic concurrency check failed; nothing was written.
    VersionConflict {
        id: String,
        expected: u64,
        current_version: u64,
        current_content: Vec<u8>,
    },
    /// The store definitely could not be reached; the call had no effect.
    Unavailable(String),
    /// The call timed out; it may or may not have taken effect.
    Timeout(String),
    /// Persistence failure (I/O, encoding).
    Storage(String),
    /// An internal lock was poisoned.
    Poisoned(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "document not found: {}", id),
            StoreError::SnapshotNotFound { id, version_number } => {
                write!(f, "snapshot {} not found for document {}", version_number, id)
            }
            StoreError::VersionConflict {
                id,
                expected,
                current_version,
                ..
            } => write!(
                f,
                "version conflict on document {} (expected version {}, current {})",
                id, expected, current_version
            ),
            StoreError::Unavailable(msg) => write!(f, "version store unavailable: {}", msg),
            StoreError::Timeout(msg) => write!(f, "version store timed out: {}", msg),
            StoreError::Storage(msg) => write!(f, "version store storage error: {}", msg),
            StoreError::Poisoned(operation) => {
                write!(f, "version store lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for StoreError {}
