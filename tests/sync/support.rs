//! Fault-injecting wrappers around the in-memory stores.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docsync::{
    Created, DocumentRecord, InMemoryLocalStore, InMemoryLockManager, InMemoryVersionStore,
    LockError, LockManager, LockToken, ManualClock, SessionId, Snapshot, SnapshotRef, StoreError,
    SyncConfig, SyncCoordinator, VersionStore,
};

/// What the next remote call should do instead of succeeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// Every call is refused.
    Unavailable,
    /// The next conditional write lands, but the caller sees a timeout.
    TimeoutAfterWrite,
    /// The next conditional write is lost and the caller sees a timeout.
    TimeoutBeforeWrite,
}

/// A version store whose transport can be broken on demand.
pub struct FlakyStore {
    inner: InMemoryVersionStore,
    fault: Mutex<Fault>,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryVersionStore::new(),
            fault: Mutex::new(Fault::None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fault(&self, fault: Fault) {
        *self.fault.lock().unwrap() = fault;
    }

    /// Remote calls made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Bypass the fault injection.
    pub fn inner(&self) -> &InMemoryVersionStore {
        &self.inner
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fault.lock().unwrap() == Fault::Unavailable {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    /// Take a one-shot write fault, if any.
    fn take_write_fault(&self) -> Fault {
        let mut fault = self.fault.lock().unwrap();
        match *fault {
            f @ (Fault::TimeoutAfterWrite | Fault::TimeoutBeforeWrite) => {
                *fault = Fault::None;
                f
            }
            f => f,
        }
    }
}

impl VersionStore for FlakyStore {
    fn create(&self, content: Vec<u8>) -> Result<Created, StoreError> {
        self.enter()?;
        self.inner.create(content)
    }

    fn read(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        self.enter()?;
        self.inner.read(id)
    }

    fn conditional_write(
        &self,
        id: &str,
        content: Vec<u8>,
        expected_version: Option<u64>,
        writer: Option<&SessionId>,
    ) -> Result<u64, StoreError> {
        self.enter()?;
        match self.take_write_fault() {
            Fault::TimeoutBeforeWrite => Err(StoreError::Timeout("no response".into())),
            Fault::TimeoutAfterWrite => {
                self.inner
                    .conditional_write(id, content, expected_version, writer)?;
                Err(StoreError::Timeout("no response".into()))
            }
            _ => self
                .inner
                .conditional_write(id, content, expected_version, writer),
        }
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.delete(id)
    }

    fn snapshot(&self, id: &str, label: Option<&str>) -> Result<SnapshotRef, StoreError> {
        self.enter()?;
        self.inner.snapshot(id, label)
    }

    fn list_snapshots(&self, id: &str) -> Result<Vec<Snapshot>, StoreError> {
        self.enter()?;
        self.inner.list_snapshots(id)
    }

    fn read_snapshot(&self, id: &str, version_number: u64) -> Result<Vec<u8>, StoreError> {
        self.enter()?;
        self.inner.read_snapshot(id, version_number)
    }
}

/// A lock manager that can be cut off, and whose release can be made to fail.
pub struct FlakyLocks {
    inner: InMemoryLockManager,
    down: AtomicBool,
    failing_release: AtomicBool,
}

impl FlakyLocks {
    pub fn new(inner: InMemoryLockManager) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
            failing_release: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_failing_release(&self, failing: bool) {
        self.failing_release.store(failing, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryLockManager {
        &self.inner
    }

    fn enter(&self) -> Result<(), LockError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(LockError::Unavailable("lock service unreachable".into()));
        }
        Ok(())
    }
}

impl LockManager for FlakyLocks {
    fn acquire(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        self.enter()?;
        self.inner.acquire(document_id, session)
    }

    fn release(&self, document_id: &str, session: &SessionId) -> Result<(), LockError> {
        self.enter()?;
        if self.failing_release.load(Ordering::SeqCst) {
            return Err(LockError::Unavailable("release dropped".into()));
        }
        self.inner.release(document_id, session)
    }

    fn heartbeat(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        self.enter()?;
        self.inner.heartbeat(document_id, session)
    }

    fn holder(&self, document_id: &str) -> Result<Option<LockToken>, LockError> {
        self.enter()?;
        self.inner.holder(document_id)
    }

    fn remove(&self, document_id: &str) -> Result<(), LockError> {
        self.enter()?;
        self.inner.remove(document_id)
    }

    fn ttl(&self) -> Duration {
        self.inner.ttl()
    }
}

pub type FlakyCoordinator = SyncCoordinator<FlakyStore, FlakyLocks, InMemoryLocalStore>;

pub const TTL: Duration = Duration::from_secs(60);

/// Coordinator over flaky remotes, with lock expiry driven by `clock`.
pub fn flaky_coordinator(clock: &ManualClock) -> FlakyCoordinator {
    let locks = InMemoryLockManager::with_clock(TTL, Arc::new(clock.clone()));
    SyncCoordinator::new(
        FlakyStore::new(),
        FlakyLocks::new(locks),
        InMemoryLocalStore::new(),
    )
    .with_config(SyncConfig::default().with_lock_ttl(TTL))
    .unwrap()
}

pub fn tables(names: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "tables": names })).unwrap()
}

pub fn session(name: &str) -> SessionId {
    SessionId::from(name)
}
