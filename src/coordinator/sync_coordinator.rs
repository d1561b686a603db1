use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigError, SyncConfig};
use crate::document::{InMemoryVersionStore, Snapshot, SnapshotRef, StoreError, VersionStore};
use crate::error::SyncError;
use crate::local::{InMemoryLocalStore, LocalStore};
use crate::lock::{HeartbeatThread, InMemoryLockManager, LockError, LockGuard, LockManager};
use crate::session::SessionId;

use super::edit_session::{EditRegistry, EditSession};
use super::outcome::{LoadedDocument, SaveOutcome};

/// Sequences lock, read and conditional write into one save.
///
/// ```text
/// save(id, content, session)
///   no id        -> create remotely, or locally if the remote is unreachable
///   local id     -> local store only, no lock, no version
///   remote id    -> acquire lock -> read version -> conditional write -> release lock
/// ```
///
/// The lock is released on every exit path of a save, unless the same
/// session has an open [`EditSession`] on the document, in which case the
/// edit session keeps it. Remote unavailability at any step moves the content
/// into the local store; the edit is never dropped.
pub struct SyncCoordinator<S, L, F>
where
    S: VersionStore,
    L: LockManager + 'static,
    F: LocalStore,
{
    store: Arc<S>,
    locks: Arc<L>,
    local: Arc<F>,
    config: SyncConfig,
    editing: EditRegistry,
}

impl SyncCoordinator<InMemoryVersionStore, InMemoryLockManager, InMemoryLocalStore> {
    /// Fully in-memory coordinator configured from `config`.
    ///
    /// Fails if `config` does not pass [`SyncConfig::validate`].
    pub fn in_memory(config: SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let locks = InMemoryLockManager::with_ttl(config.lock_ttl());
        let local = InMemoryLocalStore::with_prefix(config.local_prefix.clone());
        Self::new(InMemoryVersionStore::new(), locks, local).with_config(config)
    }
}

impl<S, L, F> SyncCoordinator<S, L, F>
where
    S: VersionStore,
    L: LockManager + 'static,
    F: LocalStore,
{
    pub fn new(store: S, locks: L, local: F) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(locks), Arc::new(local))
    }

    /// Build from handles shared with other components (e.g. an HTTP server).
    pub fn from_shared(store: Arc<S>, locks: Arc<L>, local: Arc<F>) -> Self {
        Self {
            store,
            locks,
            local,
            config: SyncConfig::default(),
            editing: EditRegistry::default(),
        }
    }

    /// Replace the default config after validating it.
    pub fn with_config(mut self, config: SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn locks(&self) -> &Arc<L> {
        &self.locks
    }

    pub fn local(&self) -> &Arc<F> {
        &self.local
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Period of edit-session heartbeats: the configured interval, capped at
    /// a third of the lock manager's own TTL.
    pub fn heartbeat_interval(&self) -> Duration {
        self.config.heartbeat_interval().min(self.locks.ttl() / 3)
    }

    /// Persist `content`, creating the document when `document_id` is `None`.
    ///
    /// Fails with [`SyncError::LockHeld`] when another session is editing;
    /// that is never retried silently.
    pub fn save_document(
        &self,
        document_id: Option<&str>,
        content: Vec<u8>,
        session: &SessionId,
    ) -> Result<SaveOutcome, SyncError> {
        match document_id {
            None => self.create(content),
            Some(id) => self.save(id, None, content, session),
        }
    }

    /// Like [`save_document`](Self::save_document), but the edit is based on
    /// `base_version`. If the stored document has moved past it, the save
    /// reports [`SaveOutcome::Conflict`] without writing.
    pub fn save_document_from(
        &self,
        document_id: &str,
        base_version: u64,
        content: Vec<u8>,
        session: &SessionId,
    ) -> Result<SaveOutcome, SyncError> {
        self.save(document_id, Some(base_version), content, session)
    }

    /// Current content and version of a remote or local document.
    pub fn load_document(&self, document_id: &str) -> Result<LoadedDocument, SyncError> {
        if self.local.is_local(document_id) {
            let content = self.local.read(document_id)?;
            return Ok(LoadedDocument {
                id: document_id.to_string(),
                content,
                version: 1,
                last_modified_by: None,
                local: true,
            });
        }
        let record = self.store.read(document_id)?;
        Ok(LoadedDocument {
            id: record.id,
            content: record.content,
            version: record.version,
            last_modified_by: record.last_modified_by,
            local: false,
        })
    }

    /// Capture a named snapshot. Only remote documents have history.
    pub fn create_snapshot(
        &self,
        document_id: &str,
        label: Option<&str>,
    ) -> Result<SnapshotRef, SyncError> {
        if self.local.is_local(document_id) {
            return Err(SyncError::NotFound(format!(
                "{} (local documents have no snapshots)",
                document_id
            )));
        }
        let snapshot = self.store.snapshot(document_id, label)?;
        tracing::info!(
            document_id,
            version_number = snapshot.version_number,
            "snapshot created"
        );
        Ok(snapshot)
    }

    /// Snapshot history, oldest first. Empty for local documents.
    pub fn list_snapshots(&self, document_id: &str) -> Result<Vec<Snapshot>, SyncError> {
        if self.local.is_local(document_id) {
            return Ok(Vec::new());
        }
        Ok(self.store.list_snapshots(document_id)?)
    }

    /// Content of a snapshot. Applying it is a separate save by the caller.
    pub fn restore_snapshot(
        &self,
        document_id: &str,
        version_number: u64,
    ) -> Result<Vec<u8>, SyncError> {
        if self.local.is_local(document_id) {
            return Err(SyncError::NotFound(format!(
                "{} snapshot {}",
                document_id, version_number
            )));
        }
        Ok(self.store.read_snapshot(document_id, version_number)?)
    }

    /// Delete a document and drop its lock. Deleting a missing document is not an error.
    pub fn delete_document(&self, document_id: &str) -> Result<(), SyncError> {
        if self.local.is_local(document_id) {
            self.local.delete(document_id)?;
            return Ok(());
        }
        self.store.delete(document_id)?;
        if let Err(err) = self.locks.remove(document_id) {
            tracing::warn!(document_id, error = %err, "failed to drop lock of deleted document");
        }
        Ok(())
    }

    /// Take the document's lock and keep it alive until the session ends.
    ///
    /// Fails with [`SyncError::LockHeld`] when another session is editing.
    /// Local documents get an inert session.
    pub fn begin_edit_session(
        &self,
        document_id: &str,
        session: &SessionId,
    ) -> Result<EditSession<L>, SyncError> {
        if self.local.is_local(document_id) {
            return Ok(EditSession::local(
                document_id.to_string(),
                session.clone(),
            ));
        }

        let token = self.locks.acquire(document_id, session)?;
        let interval = self.heartbeat_interval();
        tracing::debug!(
            document_id,
            session = %session,
            expires_at = ?token.expires_at,
            heartbeat = ?interval,
            "edit session started"
        );
        let heartbeat =
            HeartbeatThread::spawn(self.locks.clone(), document_id, session.clone(), interval);
        Ok(EditSession::remote(
            document_id.to_string(),
            session.clone(),
            self.locks.clone(),
            self.editing.clone(),
            heartbeat,
        ))
    }

    /// Stop the heartbeat and release the lock held by `edit`.
    pub fn end_edit_session(&self, edit: EditSession<L>) {
        let stats = edit.end();
        tracing::debug!(
            beats = stats.beats,
            failures = stats.failures,
            "edit session ended"
        );
    }

    fn create(&self, content: Vec<u8>) -> Result<SaveOutcome, SyncError> {
        match self.store.create(content.clone()) {
            Ok(created) => Ok(SaveOutcome::Saved {
                document_id: created.id,
                version: created.version,
            }),
            Err(StoreError::Unavailable(reason)) | Err(StoreError::Timeout(reason)) => {
                self.fall_back(content, &reason)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(
        &self,
        document_id: &str,
        base_version: Option<u64>,
        content: Vec<u8>,
        session: &SessionId,
    ) -> Result<SaveOutcome, SyncError> {
        if self.local.is_local(document_id) {
            self.local.update(document_id, content)?;
            return Ok(SaveOutcome::LocalFallback {
                local_id: document_id.to_string(),
            });
        }

        let guard = match LockGuard::acquire(&*self.locks, document_id, session) {
            Ok(guard) => guard,
            Err(LockError::Unavailable(reason)) => return self.fall_back(content, &reason),
            Err(err) => {
                tracing::info!(document_id, session = %session, error = %err, "save refused");
                return Err(err.into());
            }
        };

        let outcome = self.write_locked(document_id, base_version, content, session);

        if self.editing.is_open(document_id, session) {
            guard.retain();
        } else if let Err(err) = guard.release() {
            tracing::warn!(
                document_id,
                session = %session,
                error = %err,
                "lock release after save failed; lease will expire on its own"
            );
        }

        outcome
    }

    fn write_locked(
        &self,
        document_id: &str,
        base_version: Option<u64>,
        content: Vec<u8>,
        session: &SessionId,
    ) -> Result<SaveOutcome, SyncError> {
        let record = match self.store.read(document_id) {
            Ok(record) => record,
            Err(StoreError::Unavailable(reason)) | Err(StoreError::Timeout(reason)) => {
                return self.fall_back(content, &reason)
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(base) = base_version {
            if base != record.version {
                return Ok(self.conflict(document_id, record.version, record.content));
            }
        }

        let expected = record.version;
        match self.store.conditional_write(
            document_id,
            content.clone(),
            Some(expected),
            Some(session),
        ) {
            Ok(version) => Ok(SaveOutcome::Saved {
                document_id: document_id.to_string(),
                version,
            }),
            Err(StoreError::VersionConflict {
                current_version,
                current_content,
                ..
            }) => Ok(self.conflict(document_id, current_version, current_content)),
            Err(StoreError::Unavailable(reason)) => self.fall_back(content, &reason),
            Err(StoreError::Timeout(reason)) => {
                tracing::warn!(document_id, %reason, "write outcome unknown; re-reading");
                self.resolve_ambiguous_write(document_id, expected, content, session)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// After a timed-out write, look at what actually landed.
    fn resolve_ambiguous_write(
        &self,
        document_id: &str,
        expected: u64,
        content: Vec<u8>,
        session: &SessionId,
    ) -> Result<SaveOutcome, SyncError> {
        let record = match self.store.read(document_id) {
            Ok(record) => record,
            Err(StoreError::Unavailable(reason)) | Err(StoreError::Timeout(reason)) => {
                return self.fall_back(content, &reason)
            }
            Err(err) => return Err(err.into()),
        };

        let ours = record.version == expected + 1
            && record.last_modified_by.as_ref() == Some(session)
            && record.content == content;
        if ours {
            return Ok(SaveOutcome::Saved {
                document_id: document_id.to_string(),
                version: record.version,
            });
        }
        if record.version != expected {
            return Ok(self.conflict(document_id, record.version, record.content));
        }

        // The write never landed; one more attempt with the same precondition.
        match self.store.conditional_write(
            document_id,
            content.clone(),
            Some(expected),
            Some(session),
        ) {
            Ok(version) => Ok(SaveOutcome::Saved {
                document_id: document_id.to_string(),
                version,
            }),
            Err(StoreError::VersionConflict {
                current_version,
                current_content,
                ..
            }) => Ok(self.conflict(document_id, current_version, current_content)),
            Err(StoreError::Unavailable(reason)) | Err(StoreError::Timeout(reason)) => {
                self.fall_back(content, &reason)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn conflict(
        &self,
        document_id: &str,
        current_version: u64,
        current_content: Vec<u8>,
    ) -> SaveOutcome {
        tracing::info!(document_id, current_version, "version conflict");
        SaveOutcome::Conflict {
            document_id: document_id.to_string(),
            current_version,
            current_content,
        }
    }

    fn fall_back(&self, content: Vec<u8>, reason: &str) -> Result<SaveOutcome, SyncError> {
        let local_id = self.local.create(content)?;
        tracing::warn!(%local_id, %reason, "remote store unreachable; saved locally");
        Ok(SaveOutcome::LocalFallback { local_id })
    }
}
