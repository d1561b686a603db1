use std::fmt;

use crate::session::SessionId;

/// Error type for lock operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// A different session holds a live lock on the document.
    Held {
        document_id: String,
        holder: SessionId,
    },
    /// Release attempted by a session that does not hold the live lock.
    NotHolder {
        document_id: String,
        holder: SessionId,
    },
    /// No live lock exists (never acquired, released, or expired).
    NotFound(String),
    /// The lock service could not be reached.
    Unavailable(String),
    /// The underlying lock table was poisoned (a thread panicked while holding it).
    Poisoned(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Held {
                document_id,
                holder,
            } => write!(f, "document {} is locked by {}", document_id, holder),
            LockError::NotHolder {
                document_id,
                holder,
            } => write!(
                f,
                "lock on document {} is held by {}, not the caller",
                document_id, holder
            ),
            LockError::NotFound(document_id) => {
                write!(f, "no live lock on document {}", document_id)
            }
            LockError::Unavailable(msg) => write!(f, "lock service unavailable: {}", msg),
            LockError::Poisoned(msg) => write!(f, "lock poisoned: {}", msg),
        }
    }
}

impl std::error::Error for LockError {}
