//! HTTP surface for the remote side: version store and lock manager.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `POST   /designs` - create, `201 { id, version }`
//! - `GET    /designs/:id` - current content and version
//! - `PATCH  /designs/:id` - conditional write when `version` is given, else last writer wins
//! - `DELETE /designs/:id` - delete document and its lock, `204`
//! - `POST   /designs/:id/snapshot` - capture a snapshot, `201`
//! - `GET    /designs/:id/versions` - snapshot list, oldest first
//! - `GET    /designs/:id/versions/:n` - snapshot content
//! - `GET    /designs/:id/lock` - the live lease, or `null`
//! - `POST   /designs/:id/lock` - acquire, `423` when held by another session
//! - `DELETE /designs/:id/lock` - release, `204`
//! - `POST   /designs/:id/heartbeat` - renew, `423` / `410` on failure
//! - `GET    /health` - `{ ok, lockTtlMs }`
//!
//! Error bodies are [`ErrorBody`]: `{ "error": "..." }`, plus `holder` on
//! `423`/`403` and `currentVersion`/`currentContent` on a version conflict
//! (`409`).
//!
//! [`HttpVersionStore`] and [`HttpLockManager`] are the matching blocking
//! clients, so a [`SyncCoordinator`](crate::SyncCoordinator) can run against
//! a remote server.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docsync::{http, InMemoryLockManager, InMemoryVersionStore};
//!
//! let state = http::HttpState::new(
//!     Arc::new(InMemoryVersionStore::new()),
//!     Arc::new(InMemoryLockManager::new()),
//! );
//! http::serve(state, "0.0.0.0:5000").await?;
//! ```

mod client;
mod wire;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::document::{StoreError, VersionStore};
use crate::error::SyncError;
use crate::lock::{LockError, LockManager};

pub use client::{HttpLockManager, HttpVersionStore, DEFAULT_TIMEOUT};
pub use wire::{
    decode_content, encode_content, CreateDocumentRequest, CreateDocumentResponse, DocumentBody,
    ErrorBody, HealthBody, LockBody, LockRequest, SnapshotContent, SnapshotCreated,
    SnapshotRequest, SnapshotSummary, WriteDocumentRequest, WriteDocumentResponse,
};

/// Shared handles served by the router.
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn VersionStore>,
    pub locks: Arc<dyn LockManager>,
}

impl HttpState {
    pub fn new(store: Arc<dyn VersionStore>, locks: Arc<dyn LockManager>) -> Self {
        Self { store, locks }
    }
}

/// Build an axum `Router` over the given store and lock manager.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/designs", post(create_handler))
        .route(
            "/designs/:id",
            get(read_handler).patch(write_handler).delete(delete_handler),
        )
        .route("/designs/:id/snapshot", post(snapshot_handler))
        .route("/designs/:id/versions", get(list_snapshots_handler))
        .route("/designs/:id/versions/:number", get(read_snapshot_handler))
        .route(
            "/designs/:id/lock",
            get(holder_handler).post(lock_handler).delete(unlock_handler),
        )
        .route("/designs/:id/heartbeat", post(heartbeat_handler))
        .with_state(state)
}

/// Serve over HTTP at the given address (e.g. `"0.0.0.0:5000"`).
pub async fn serve(state: HttpState, addr: &str) -> Result<(), std::io::Error> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "docsync server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not listen for ctrl-c; serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Handler failure mapped to a status code and JSON body.
#[derive(Debug)]
pub enum ApiError {
    Sync(SyncError),
    BadRequest(String),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError::Sync(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Sync(err.into())
    }
}

impl From<LockError> for ApiError {
    fn from(err: LockError) -> Self {
        ApiError::Sync(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (400, ErrorBody::new(message)),
            ApiError::Sync(err) => {
                let status = err.status_code();
                let mut body = ErrorBody::new(err.to_string());
                match err {
                    SyncError::VersionConflict {
                        current_version,
                        current_content,
                        ..
                    } => {
                        body.current_version = Some(current_version);
                        body.current_content = Some(encode_content(&current_content));
                    }
                    SyncError::LockHeld { holder, .. } | SyncError::NotLockHolder { holder, .. } => {
                        body.holder = Some(holder);
                    }
                    _ if status >= 500 => tracing::error!(error = %body.error, "request failed"),
                    _ => {}
                }
                (status, body)
            }
        };
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

fn decode(content: &str) -> Result<Vec<u8>, ApiError> {
    decode_content(content).map_err(|e| ApiError::BadRequest(format!("content is not base64: {e}")))
}

async fn health_handler(State(state): State<HttpState>) -> Json<HealthBody> {
    Json(HealthBody {
        ok: true,
        lock_ttl_ms: state.locks.ttl().as_millis() as u64,
    })
}

async fn create_handler(
    State(state): State<HttpState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.store.create(decode(&req.content)?)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateDocumentResponse {
            id: created.id,
            version: created.version,
        }),
    ))
}

async fn read_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentBody>, ApiError> {
    Ok(Json(state.store.read(&id)?.into()))
}

async fn write_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Json(req): Json<WriteDocumentRequest>,
) -> Result<Json<WriteDocumentResponse>, ApiError> {
    let content = decode(&req.content)?;
    let version = state.store.conditional_write(
        &id,
        content,
        req.version,
        req.last_modified_by.as_ref(),
    )?;
    Ok(Json(WriteDocumentResponse { version }))
}

async fn delete_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id)?;
    if let Err(err) = state.locks.remove(&id) {
        tracing::warn!(document_id = %id, error = %err, "failed to drop lock of deleted document");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn snapshot_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    body: Option<Json<SnapshotRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let snapshot = state.store.snapshot(&id, req.comment.as_deref())?;
    Ok((StatusCode::CREATED, Json(SnapshotCreated::from(snapshot))))
}

async fn list_snapshots_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SnapshotSummary>>, ApiError> {
    let snapshots = state.store.list_snapshots(&id)?;
    Ok(Json(snapshots.iter().map(SnapshotSummary::from).collect()))
}

async fn read_snapshot_handler(
    State(state): State<HttpState>,
    Path((id, number)): Path<(String, u64)>,
) -> Result<Json<SnapshotContent>, ApiError> {
    let content = state.store.read_snapshot(&id, number)?;
    Ok(Json(SnapshotContent {
        version_number: number,
        content: encode_content(&content),
    }))
}

async fn holder_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<Option<LockBody>>, ApiError> {
    Ok(Json(state.locks.holder(&id)?.map(LockBody::from)))
}

async fn lock_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Json(req): Json<LockRequest>,
) -> Result<Json<LockBody>, ApiError> {
    Ok(Json(state.locks.acquire(&id, &req.session_id)?.into()))
}

async fn unlock_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Json(req): Json<LockRequest>,
) -> Result<StatusCode, ApiError> {
    state.locks.release(&id, &req.session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn heartbeat_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Json(req): Json<LockRequest>,
) -> Result<Json<LockBody>, ApiError> {
    Ok(Json(state.locks.heartbeat(&id, &req.session_id)?.into()))
}
