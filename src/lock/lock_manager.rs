use std::time::Duration;

use crate::session::SessionId;

use super::{LockError, LockToken};

/// Per-document mutual exclusion with expiring leases.
///
/// At most one live lease exists per document. Expiry is evaluated lazily on
/// every call: a lease past `expires_at` behaves exactly like no lease, so a
/// crashed holder blocks others for at most one TTL. Distributed
/// implementations might keep the table in Redis, Postgres, etc.
pub trait LockManager: Send + Sync {
    /// Take the lock, or extend it if `session` already holds it.
    ///
    /// Fails with [`LockError::Held`] while another session holds a live lease.
    fn acquire(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError>;

    /// Drop the lock if `session` holds it.
    ///
    /// Absent or expired leases are a no-op. A live lease of another session
    /// fails with [`LockError::NotHolder`].
    fn release(&self, document_id: &str, session: &SessionId) -> Result<(), LockError>;

    /// Push `expires_at` one TTL past now.
    ///
    /// Fails with [`LockError::Held`] if someone else holds the lease and
    /// [`LockError::NotFound`] if there is no live lease; the caller must
    /// re-acquire in that case.
    fn heartbeat(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError>;

    /// The live lease on a document, if any.
    fn holder(&self, document_id: &str) -> Result<Option<LockToken>, LockError>;

    /// Drop any lease on the document regardless of holder. Used when the
    /// document itself is deleted.
    fn remove(&self, document_id: &str) -> Result<(), LockError>;

    /// Lifetime of a fresh or renewed lease. Heartbeats must run well inside it.
    fn ttl(&self) -> Duration;
}

impl<L: LockManager + ?Sized> LockManager for std::sync::Arc<L> {
    fn acquire(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        (**self).acquire(document_id, session)
    }

    fn release(&self, document_id: &str, session: &SessionId) -> Result<(), LockError> {
        (**self).release(document_id, session)
    }

    fn heartbeat(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        (**self).heartbeat(document_id, session)
    }

    fn holder(&self, document_id: &str) -> Result<Option<LockToken>, LockError> {
        (**self).holder(document_id)
    }

    fn remove(&self, document_id: &str) -> Result<(), LockError> {
        (**self).remove(document_id)
    }

    fn ttl(&self) -> Duration {
        (**self).ttl()
    }
}
