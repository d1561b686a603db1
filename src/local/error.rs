use std::fmt;

/// Error type for local fallback storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalStoreError {
    NotFound(String),
    /// The id does not carry the local prefix.
    NotLocal(String),
    Io(String),
    Serde(String),
    Poisoned(&'static str),
}

impl fmt::Display for LocalStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalStoreError::NotFound(id) => write!(f, "local document not found: {}", id),
            LocalStoreError::NotLocal(id) => write!(f, "not a local document id: {}", id),
            LocalStoreError::Io(msg) => write!(f, "local store i/o error: {}", msg),
            LocalStoreError::Serde(msg) => write!(f, "local store serialization error: {}", msg),
            LocalStoreError::Poisoned(operation) => {
                write!(f, "local store lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for LocalStoreError {}
