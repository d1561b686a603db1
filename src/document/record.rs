use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Current state of a remote document as returned by [`VersionStore::read`].
///
/// [`VersionStore::read`]: super::VersionStore::read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: String,
    pub content: Vec<u8>,
    pub version: u64,
    pub last_modified_by: Option<SessionId>,
}

/// Handle returned by [`VersionStore::create`].
///
/// [`VersionStore::create`]: super::VersionStore::create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub id: String,
    pub version: u64,
}

/// An immutable captured copy of a document's content.
///
/// `version_number` comes from a per-document snapshot counter that is
/// independent of the edit version; `document_version` records which edit
/// version was current at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version_number: u64,
    pub document_version: u64,
    pub content: Vec<u8>,
    pub committed_at: SystemTime,
    pub label: Option<String>,
}

/// Reference to a freshly captured snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub document_id: String,
    pub version_number: u64,
    pub committed_at: SystemTime,
}
