use super::{LocalFilter, LocalPage, LocalStoreError};

/// Client-local persistence used when the remote store cannot be reached.
///
/// Single writer, no locking, no versioning: callers that ask for a version
/// of a local document always get 1.
pub trait LocalStore: Send + Sync {
    /// Prefix that every id issued by this store starts with.
    fn prefix(&self) -> &str;

    /// Store a new document and return its local id.
    fn create(&self, content: Vec<u8>) -> Result<String, LocalStoreError>;

    /// Replace the content of a local document.
    ///
    /// An id that carries the local prefix but is not stored yet is inserted,
    /// so an edit is never dropped.
    fn update(&self, id: &str, content: Vec<u8>) -> Result<(), LocalStoreError>;

    fn read(&self, id: &str) -> Result<Vec<u8>, LocalStoreError>;

    /// Remove a local document. Missing ids are not an error.
    fn delete(&self, id: &str) -> Result<(), LocalStoreError>;

    /// Summaries matching `filter`, in creation order, one page at a time.
    fn list(&self, filter: &LocalFilter) -> Result<LocalPage, LocalStoreError>;

    fn is_local(&self, id: &str) -> bool {
        is_local_id(id, self.prefix())
    }
}

/// Whether `id` lives in the local namespace marked by `prefix`.
pub fn is_local_id(id: &str, prefix: &str) -> bool {
    !prefix.is_empty() && id.starts_with(prefix)
}

impl<S: LocalStore + ?Sized> LocalStore for std::sync::Arc<S> {
    fn prefix(&self) -> &str {
        (**self).prefix()
    }

    fn create(&self, content: Vec<u8>) -> Result<String, LocalStoreError> {
        (**self).create(content)
    }

    fn update(&self, id: &str, content: Vec<u8>) -> Result<(), LocalStoreError> {
        (**self).update(id, content)
    }

    fn read(&self, id: &str) -> Result<Vec<u8>, LocalStoreError> {
        (**self).read(id)
    }

    fn delete(&self, id: &str) -> Result<(), LocalStoreError> {
        (**self).delete(id)
    }

    fn list(&self, filter: &LocalFilter) -> Result<LocalPage, LocalStoreError> {
        (**self).list(filter)
    }
}
