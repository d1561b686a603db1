//! Local fallback - client-side persistence when the remote store is unreachable.
//!
//! Local ids live in their own namespace (default prefix `local_`), so the
//! coordinator can tell at a glance that a document must bypass locking and
//! versioning entirely.

mod error;
mod file;
mod in_memory;
mod store;
mod table;

pub use error::LocalStoreError;
pub use file::FileLocalStore;
pub use in_memory::InMemoryLocalStore;
pub use store::{is_local_id, LocalStore};
pub use table::{LocalFilter, LocalPage, LocalSummary};
