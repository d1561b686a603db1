use crate::session::SessionId;

/// Result of a save that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The remote store accepted the write.
    Saved { document_id: String, version: u64 },
    /// Someone else wrote first. Nothing was written; the caller decides
    /// whether to reload or to overwrite.
    Conflict {
        document_id: String,
        current_version: u64,
        current_content: Vec<u8>,
    },
    /// The remote store was unreachable (or the document is local); the
    /// content now lives in the local store under `local_id`.
    LocalFallback { local_id: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, SaveOutcome::Conflict { .. })
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SaveOutcome::LocalFallback { .. })
    }

    /// Id to use for the next save of this document.
    pub fn document_id(&self) -> &str {
        match self {
            SaveOutcome::Saved { document_id, .. } | SaveOutcome::Conflict { document_id, .. } => {
                document_id
            }
            SaveOutcome::LocalFallback { local_id } => local_id,
        }
    }
}

/// A document as loaded for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub id: String,
    pub content: Vec<u8>,
    /// Always 1 for local documents.
    pub version: u64,
    pub last_modified_by: Option<SessionId>,
    pub local: bool,
}
