use crate::session::SessionId;

use super::{LockError, LockManager, LockToken};

/// Scoped lock acquisition.
///
/// The lease is released when the guard is dropped, on every exit path of the
/// critical section. Release failures on drop are logged and swallowed: the
/// lease expires on its own after one TTL.
///
/// ```ignore
/// let guard = LockGuard::acquire(&locks, "doc-1", &session)?;
/// let record = store.read("doc-1")?;
/// store.conditional_write("doc-1", content, Some(record.version), Some(&session))?;
/// guard.release()?;
/// ```
pub struct LockGuard<'a, L: LockManager + ?Sized> {
    manager: &'a L,
    token: LockToken,
    armed: bool,
}

impl<'a, L: LockManager + ?Sized> LockGuard<'a, L> {
    pub fn acquire(
        manager: &'a L,
        document_id: &str,
        session: &SessionId,
    ) -> Result<Self, LockError> {
        let token = manager.acquire(document_id, session)?;
        Ok(Self {
            manager,
            token,
            armed: true,
        })
    }

    pub fn token(&self) -> &LockToken {
        &self.token
    }

    /// Release now and report the outcome.
    pub fn release(mut self) -> Result<(), LockError> {
        self.armed = false;
        self.manager
            .release(&self.token.document_id, &self.token.holder)
    }

    /// Keep the lease past the guard's scope (an edit session owns it).
    pub fn retain(mut self) -> LockToken {
        self.armed = false;
        self.token.clone()
    }
}

impl<L: LockManager + ?Sized> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self
            .manager
            .release(&self.token.document_id, &self.token.holder)
        {
            tracing::warn!(
                document_id = %self.token.document_id,
                session = %self.token.holder,
                error = %err,
                "lock release failed; lease will expire on its own"
            );
        }
    }
}
