//! SyncCoordinator - the single "save" entry point for editor code.
//!
//! ## Quick Start
//!
//! ```ignore
//! use docsync::{SaveOutcome, SessionId, SyncConfig, SyncCoordinator};
//!
//! let sync = SyncCoordinator::in_memory(SyncConfig::default())?;
//! let me = SessionId::generate();
//!
//! let SaveOutcome::Saved { document_id, .. } =
//!     sync.save_document(None, br#"{"tables":[]}"#.to_vec(), &me)?
//! else { unreachable!() };
//!
//! let edit = sync.begin_edit_session(&document_id, &me)?;
//! match sync.save_document(Some(&document_id), br#"{"tables":["users"]}"#.to_vec(), &me)? {
//!     SaveOutcome::Saved { version, .. } => println!("saved v{version}"),
//!     SaveOutcome::Conflict { current_version, .. } => println!("reload v{current_version}"),
//!     SaveOutcome::LocalFallback { local_id } => println!("offline, kept as {local_id}"),
//! }
//! sync.end_edit_session(edit);
//! ```

mod edit_session;
mod outcome;
mod sync_coordinator;

pub use edit_session::EditSession;
pub use outcome::{LoadedDocument, SaveOutcome};
pub use sync_coordinator::SyncCoordinator;
