//! Documents - versioned content with optimistic concurrency and snapshot history.
//!
//! A document starts at version 1 and every accepted write bumps the version
//! by exactly one. Writes carry the version the writer last read; the store
//! rejects the write with [`StoreError::VersionConflict`] when someone else
//! got there first. Snapshots are numbered by their own counter and never
//! touch the edit version.
//!
//! ## Example
//!
//! ```ignore
//! use docsync::{InMemoryVersionStore, SessionId, VersionStore};
//!
//! let store = InMemoryVersionStore::new();
//! let doc = store.create(br#"{"tables":[]}"#.to_vec())?;
//! let me = SessionId::from("session-a");
//!
//! let v2 = store.conditional_write(&doc.id, b"...".to_vec(), Some(doc.version), Some(&me))?;
//! assert_eq!(v2, 2);
//! ```

mod error;
mod file;
mod in_memory;
mod record;
mod store;
mod table;

pub use error::StoreError;
pub use file::FileVersionStore;
pub use in_memory::InMemoryVersionStore;
pub use record::{Created, DocumentRecord, Snapshot, SnapshotRef};
pub use store::VersionStore;
