//! Locks - per-document mutual exclusion with expiring leases.
//!
//! A lock gates who may *attempt* a write and tells other clients that
//! someone is editing. It is not what keeps writes safe: the version check in
//! [`VersionStore::conditional_write`](crate::VersionStore::conditional_write)
//! is. Holding the lock never means the last-read version is still current.

mod error;
mod guard;
mod heartbeat;
mod in_memory;
mod lock_manager;
mod token;

pub use error::LockError;
pub use guard::LockGuard;
pub use heartbeat::{HeartbeatStats, HeartbeatThread};
pub use in_memory::InMemoryLockManager;
pub use lock_manager::LockManager;
pub use token::LockToken;
