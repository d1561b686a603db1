//! JSON bodies of the HTTP surface. Content travels base64-encoded.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::document::{DocumentRecord, Snapshot, SnapshotRef};
use crate::id::unix_millis;
use crate::lock::LockToken;
use crate::session::SessionId;

pub fn encode_content(content: &[u8]) -> String {
    STANDARD.encode(content)
}

pub fn decode_content(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(content)
}

fn millis(at: SystemTime) -> u64 {
    unix_millis(at) as u64
}

fn at_millis(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

/// Body of every non-2xx response.
///
/// `holder` is set for `423` and `403`; `409` carries the current version
/// and base64 content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_content: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}

/// `GET /health`. Clients size their heartbeats from `lock_ttl_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBody {
    pub ok: bool,
    pub lock_ttl_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    pub id: String,
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBody {
    pub id: String,
    pub content: String,
    pub version: u64,
    pub last_modified_by: Option<SessionId>,
}

impl From<DocumentRecord> for DocumentBody {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            content: encode_content(&record.content),
            version: record.version,
            last_modified_by: record.last_modified_by,
        }
    }
}

/// `PATCH /designs/:id`. Omitting `version` makes the write unconditional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteDocumentRequest {
    pub content: String,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub last_modified_by: Option<SessionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteDocumentResponse {
    pub version: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCreated {
    pub version_number: u64,
    pub committed_at: u64,
}

impl SnapshotCreated {
    pub fn into_ref(self, document_id: &str) -> SnapshotRef {
        SnapshotRef {
            document_id: document_id.to_string(),
            version_number: self.version_number,
            committed_at: at_millis(self.committed_at),
        }
    }
}

impl From<SnapshotRef> for SnapshotCreated {
    fn from(snapshot: SnapshotRef) -> Self {
        Self {
            version_number: snapshot.version_number,
            committed_at: millis(snapshot.committed_at),
        }
    }
}

/// Listing entry; content is fetched separately per version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub version_number: u64,
    pub document_version: u64,
    pub label: Option<String>,
    pub committed_at: u64,
}

impl SnapshotSummary {
    pub fn into_snapshot(self, content: Vec<u8>) -> Snapshot {
        Snapshot {
            version_number: self.version_number,
            document_version: self.document_version,
            content,
            committed_at: at_millis(self.committed_at),
            label: self.label,
        }
    }
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            version_number: snapshot.version_number,
            document_version: snapshot.document_version,
            label: snapshot.label.clone(),
            committed_at: millis(snapshot.committed_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotContent {
    pub version_number: u64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockBody {
    pub document_id: String,
    pub holder: SessionId,
    pub acquired_at: u64,
    pub expires_at: u64,
}

impl From<LockToken> for LockBody {
    fn from(token: LockToken) -> Self {
        Self {
            document_id: token.document_id,
            holder: token.holder,
            acquired_at: millis(token.acquired_at),
            expires_at: millis(token.expires_at),
        }
    }
}

impl From<LockBody> for LockToken {
    fn from(body: LockBody) -> Self {
        Self {
            document_id: body.document_id,
            holder: body.holder,
            acquired_at: at_millis(body.acquired_at),
            expires_at: at_millis(body.expires_at),
        }
    }
}
