//! Blocking clients for a remote docsync server.
//!
//! [`HttpVersionStore`] and [`HttpLockManager`] speak the routes served by
//! [`router`](super::router) and map transport failures onto the error
//! variants the coordinator acts on:
//!
//! - connection refused / DNS failure -> `Unavailable` (nothing happened)
//! - timeout or broken response -> `StoreError::Timeout` (the write may have landed)
//! - `404` -> `NotFound`, `409` -> `VersionConflict`
//! - `423` -> `LockError::Held`, `403` -> `NotHolder`, `410` -> `LockError::NotFound`
//!
//! Both use `reqwest::blocking`; call them from plain threads or
//! `spawn_blocking`, never directly from an async task.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::DEFAULT_LOCK_TTL;
use crate::document::{Created, DocumentRecord, Snapshot, SnapshotRef, StoreError, VersionStore};
use crate::lock::{LockError, LockManager, LockToken};
use crate::session::SessionId;

use super::wire::{
    decode_content, encode_content, CreateDocumentRequest, CreateDocumentResponse, DocumentBody,
    ErrorBody, HealthBody, LockBody, LockRequest, SnapshotContent, SnapshotCreated,
    SnapshotRequest, SnapshotSummary, WriteDocumentRequest, WriteDocumentResponse,
};

/// Per-request timeout used by `new`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a remote call produced no usable answer.
#[derive(Debug)]
enum Failure {
    /// The request never reached the server.
    Unreachable(String),
    /// Sent, but the answer was lost; the call may have taken effect.
    NoResponse(String),
    Status(StatusCode, ErrorBody),
    /// A success status with a body we could not read.
    BadBody(String),
}

fn transport(err: reqwest::Error) -> Failure {
    if err.is_connect() {
        Failure::Unreachable(err.to_string())
    } else {
        Failure::NoResponse(err.to_string())
    }
}

#[derive(Clone)]
struct Remote {
    base: String,
    client: Client,
}

impl Remote {
    fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, Failure> {
        let response = request.send().map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .json::<ErrorBody>()
            .unwrap_or_else(|_| ErrorBody::new(status.to_string()));
        Err(Failure::Status(status, body))
    }

    fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Failure> {
        self.send(request)?.json::<T>().map_err(|e| {
            if e.is_timeout() {
                Failure::NoResponse(e.to_string())
            } else {
                Failure::BadBody(e.to_string())
            }
        })
    }
}

impl Failure {
    fn into_store(self, id: &str) -> StoreError {
        match self {
            Failure::Unreachable(msg) => StoreError::Unavailable(msg),
            Failure::NoResponse(msg) => StoreError::Timeout(msg),
            Failure::BadBody(msg) => StoreError::Storage(format!("unreadable response: {msg}")),
            Failure::Status(StatusCode::NOT_FOUND, _) => StoreError::NotFound(id.to_string()),
            Failure::Status(StatusCode::SERVICE_UNAVAILABLE, body) => {
                StoreError::Unavailable(body.error)
            }
            Failure::Status(status, body) => {
                StoreError::Storage(format!("{}: {}", status, body.error))
            }
        }
    }

    fn into_lock(self, document_id: &str) -> LockError {
        let holder = |body: ErrorBody| body.holder.unwrap_or_else(|| SessionId::from(""));
        match self {
            Failure::Unreachable(msg) | Failure::NoResponse(msg) => LockError::Unavailable(msg),
            Failure::BadBody(msg) => {
                LockError::Unavailable(format!("unreadable response: {msg}"))
            }
            Failure::Status(StatusCode::LOCKED, body) => LockError::Held {
                document_id: document_id.to_string(),
                holder: holder(body),
            },
            Failure::Status(StatusCode::FORBIDDEN, body) => LockError::NotHolder {
                document_id: document_id.to_string(),
                holder: holder(body),
            },
            Failure::Status(StatusCode::GONE, _) => LockError::NotFound(document_id.to_string()),
            Failure::Status(status, body) => {
                LockError::Unavailable(format!("{}: {}", status, body.error))
            }
        }
    }
}

fn decode(content: &str) -> Result<Vec<u8>, StoreError> {
    decode_content(content).map_err(|e| StoreError::Storage(format!("content is not base64: {e}")))
}

/// [`VersionStore`] backed by a remote server's `/designs` routes.
#[derive(Clone)]
pub struct HttpVersionStore {
    remote: Remote,
}

impl HttpVersionStore {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            remote: Remote::new(base_url, timeout)?,
        })
    }

    fn document_url(&self, id: &str) -> String {
        self.remote.url(&format!("/designs/{}", id))
    }
}

impl VersionStore for HttpVersionStore {
    fn create(&self, content: Vec<u8>) -> Result<Created, StoreError> {
        let request = self
            .remote
            .client
            .post(self.remote.url("/designs"))
            .json(&CreateDocumentRequest {
                content: encode_content(&content),
            });
        let created: CreateDocumentResponse =
            self.remote.fetch(request).map_err(|f| f.into_store(""))?;
        Ok(Created {
            id: created.id,
            version: created.version,
        })
    }

    fn read(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        let request = self.remote.client.get(self.document_url(id));
        let body: DocumentBody = self.remote.fetch(request).map_err(|f| f.into_store(id))?;
        Ok(DocumentRecord {
            content: decode(&body.content)?,
            id: body.id,
            version: body.version,
            last_modified_by: body.last_modified_by,
        })
    }

    fn conditional_write(
        &self,
        id: &str,
        content: Vec<u8>,
        expected_version: Option<u64>,
        writer: Option<&SessionId>,
    ) -> Result<u64, StoreError> {
        let request = self
            .remote
            .client
            .patch(self.document_url(id))
            .json(&WriteDocumentRequest {
                content: encode_content(&content),
                version: expected_version,
                last_modified_by: writer.cloned(),
            });
        match self.remote.fetch::<WriteDocumentResponse>(request) {
            Ok(written) => Ok(written.version),
            Err(Failure::Status(StatusCode::CONFLICT, body)) => {
                let current_content = match body.current_content {
                    Some(content) => decode(&content)?,
                    None => Vec::new(),
                };
                Err(StoreError::VersionConflict {
                    id: id.to_string(),
                    expected: expected_version.unwrap_or_default(),
                    current_version: body.current_version.unwrap_or_default(),
                    current_content,
                })
            }
            Err(failure) => Err(failure.into_store(id)),
        }
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let request = self.remote.client.delete(self.document_url(id));
        self.remote
            .send(request)
            .map(drop)
            .map_err(|f| f.into_store(id))
    }

    fn snapshot(&self, id: &str, label: Option<&str>) -> Result<SnapshotRef, StoreError> {
        let request = self
            .remote
            .client
            .post(self.remote.url(&format!("/designs/{}/snapshot", id)))
            .json(&SnapshotRequest {
                comment: label.map(str::to_string),
            });
        let created: SnapshotCreated = self.remote.fetch(request).map_err(|f| f.into_store(id))?;
        Ok(created.into_ref(id))
    }

    fn list_snapshots(&self, id: &str) -> Result<Vec<Snapshot>, StoreError> {
        let request = self
            .remote
            .client
            .get(self.remote.url(&format!("/designs/{}/versions", id)));
        let summaries: Vec<SnapshotSummary> =
            self.remote.fetch(request).map_err(|f| f.into_store(id))?;
        summaries
            .into_iter()
            .map(|summary| {
                let content = self.read_snapshot(id, summary.version_number)?;
                Ok(summary.into_snapshot(content))
            })
            .collect()
    }

    fn read_snapshot(&self, id: &str, version_number: u64) -> Result<Vec<u8>, StoreError> {
        let request = self.remote.client.get(
            self.remote
                .url(&format!("/designs/{}/versions/{}", id, version_number)),
        );
        match self.remote.fetch::<SnapshotContent>(request) {
            Ok(snapshot) => decode(&snapshot.content),
            Err(Failure::Status(StatusCode::NOT_FOUND, _)) => Err(StoreError::SnapshotNotFound {
                id: id.to_string(),
                version_number,
            }),
            Err(failure) => Err(failure.into_store(id)),
        }
    }
}

/// [`LockManager`] backed by a remote server's lock routes.
///
/// The lease TTL is the server's; [`connect`](Self::connect) reads it from
/// `/health`, `new` assumes [`DEFAULT_LOCK_TTL`] until told otherwise.
#[derive(Clone)]
pub struct HttpLockManager {
    remote: Remote,
    ttl: Duration,
}

impl HttpLockManager {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            remote: Remote::new(base_url, DEFAULT_TIMEOUT)?,
            ttl: DEFAULT_LOCK_TTL,
        })
    }

    /// Build a client and adopt the TTL the server reports.
    pub fn connect(base_url: &str) -> Result<Self, LockError> {
        let manager = Self::new(base_url).map_err(|e| LockError::Unavailable(e.to_string()))?;
        let request = manager.remote.client.get(manager.remote.url("/health"));
        let health: HealthBody = manager
            .remote
            .fetch(request)
            .map_err(|f| f.into_lock(""))?;
        Ok(manager.with_ttl(Duration::from_millis(health.lock_ttl_ms)))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, reqwest::Error> {
        self.remote = Remote::new(&self.remote.base, timeout)?;
        Ok(self)
    }

    fn lock_request(&self, request: RequestBuilder, session: &SessionId) -> RequestBuilder {
        request.json(&LockRequest {
            session_id: session.clone(),
        })
    }

    fn lock_url(&self, document_id: &str) -> String {
        self.remote.url(&format!("/designs/{}/lock", document_id))
    }
}

impl LockManager for HttpLockManager {
    fn acquire(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        let request =
            self.lock_request(self.remote.client.post(self.lock_url(document_id)), session);
        let body: LockBody = self
            .remote
            .fetch(request)
            .map_err(|f| f.into_lock(document_id))?;
        Ok(body.into())
    }

    fn release(&self, document_id: &str, session: &SessionId) -> Result<(), LockError> {
        let request =
            self.lock_request(self.remote.client.delete(self.lock_url(document_id)), session);
        self.remote
            .send(request)
            .map(drop)
            .map_err(|f| f.into_lock(document_id))
    }

    fn heartbeat(&self, document_id: &str, session: &SessionId) -> Result<LockToken, LockError> {
        let url = self
            .remote
            .url(&format!("/designs/{}/heartbeat", document_id));
        let request = self.lock_request(self.remote.client.post(url), session);
        let body: LockBody = self
            .remote
            .fetch(request)
            .map_err(|f| f.into_lock(document_id))?;
        Ok(body.into())
    }

    fn holder(&self, document_id: &str) -> Result<Option<LockToken>, LockError> {
        let request = self.remote.client.get(self.lock_url(document_id));
        let body: Option<LockBody> = self
            .remote
            .fetch(request)
            .map_err(|f| f.into_lock(document_id))?;
        Ok(body.map(LockToken::from))
    }

    /// No-op: the server drops a document's lock when the document is deleted.
    fn remove(&self, _document_id: &str) -> Result<(), LockError> {
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
