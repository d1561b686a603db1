//! Concurrency control for shared documents.
//!
//! - [`LockManager`]: per-document leases with TTL and heartbeat renewal.
//! - [`VersionStore`]: versioned documents with compare-and-set writes and
//!   an append-only snapshot history.
//! - [`LocalStore`]: client-side fallback when the remote is unreachable.
//! - [`SyncCoordinator`]: sequences the above into one save with a
//!   [`SaveOutcome`] of saved, conflict, or local fallback.

mod clock;
mod config;
mod coordinator;
mod document;
mod error;
mod id;
mod local;
mod lock;
mod persist;
mod session;

#[cfg(feature = "http")]
pub mod http;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SyncConfig, DEFAULT_LOCAL_PREFIX, DEFAULT_LOCK_TTL};
pub use coordinator::{EditSession, LoadedDocument, SaveOutcome, SyncCoordinator};
pub use document::{
    Created, DocumentRecord, FileVersionStore, InMemoryVersionStore, Snapshot, SnapshotRef,
    StoreError, VersionStore,
};
pub use error::SyncError;
pub use local::{
    is_local_id, FileLocalStore, InMemoryLocalStore, LocalFilter, LocalPage, LocalStore,
    LocalStoreError, LocalSummary,
};
pub use lock::{
    HeartbeatStats, HeartbeatThread, InMemoryLockManager, LockError, LockGuard, LockManager,
    LockToken,
};
pub use session::{SessionFile, SessionId};
