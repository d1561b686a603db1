use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::lock::{HeartbeatStats, HeartbeatThread, LockManager};
use crate::session::SessionId;

pub(crate) type EditKey = (String, SessionId);

/// Open edit sessions, counted per (document, session).
///
/// Only consulted between remote calls; never held across one.
#[derive(Clone, Default)]
pub(crate) struct EditRegistry {
    open: Arc<Mutex<HashMap<EditKey, usize>>>,
}

impl EditRegistry {
    pub(crate) fn enter(&self, key: &EditKey) {
        let mut open = match self.open.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *open.entry(key.clone()).or_insert(0) += 1;
    }

    /// Returns true when this was the last open session for the key.
    pub(crate) fn leave(&self, key: &EditKey) -> bool {
        let mut open = match self.open.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match open.get_mut(key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                open.remove(key);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_open(&self, document_id: &str, session: &SessionId) -> bool {
        let open = match self.open.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        open.contains_key(&(document_id.to_string(), session.clone()))
    }
}

/// Handle for an open edit session started by
/// [`SyncCoordinator::begin_edit_session`](super::SyncCoordinator::begin_edit_session).
///
/// While open, the session's lease is renewed in the background and saves by
/// the same session keep the lock instead of releasing it. [`end`](Self::end)
/// stops the heartbeat and releases the lock; dropping the handle does the
/// same without waiting for the heartbeat thread.
pub struct EditSession<L: LockManager + 'static> {
    document_id: String,
    session: SessionId,
    heartbeat: Option<HeartbeatThread>,
    locks: Option<Arc<L>>,
    registry: EditRegistry,
    open: bool,
}

impl<L: LockManager + 'static> EditSession<L> {
    pub(crate) fn remote(
        document_id: String,
        session: SessionId,
        locks: Arc<L>,
        registry: EditRegistry,
        heartbeat: HeartbeatThread,
    ) -> Self {
        registry.enter(&(document_id.clone(), session.clone()));
        Self {
            document_id,
            session,
            heartbeat: Some(heartbeat),
            locks: Some(locks),
            registry,
            open: true,
        }
    }

    /// Local documents have nothing to lock or renew.
    pub(crate) fn local(document_id: String, session: SessionId) -> Self {
        Self {
            document_id,
            session,
            heartbeat: None,
            locks: None,
            registry: EditRegistry::default(),
            open: true,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// True for remote documents, which hold a lock and a heartbeat.
    pub fn is_remote(&self) -> bool {
        self.locks.is_some()
    }

    /// Stop renewing, release the lock and return heartbeat statistics.
    pub fn end(mut self) -> HeartbeatStats {
        let stats = match self.heartbeat.take() {
            Some(heartbeat) => heartbeat.stop(),
            None => HeartbeatStats::default(),
        };
        self.close();
        stats
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        let Some(locks) = &self.locks else {
            return;
        };
        let last = self
            .registry
            .leave(&(self.document_id.clone(), self.session.clone()));
        if !last {
            return;
        }
        if let Err(err) = locks.release(&self.document_id, &self.session) {
            tracing::warn!(
                document_id = %self.document_id,
                session = %self.session,
                error = %err,
                "lock release at end of edit session failed; lease will expire on its own"
            );
        }
    }
}

impl<L: LockManager + 'static> Drop for EditSession<L> {
    fn drop(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.signal_stop();
        }
        self.close();
    }
}
