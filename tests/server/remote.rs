//! `SyncCoordinator` driven through the blocking HTTP clients.
//!
//! The server runs on its own thread and runtime so the blocking clients are
//! never called from inside an async context.

use std::net::TcpListener as StdListener;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use docsync::http::{self, HttpLockManager, HttpState, HttpVersionStore};
use docsync::{
    InMemoryLocalStore, InMemoryLockManager, InMemoryVersionStore, LockError, LockManager,
    SaveOutcome, SessionId, StoreError, SyncCoordinator, SyncError, VersionStore,
};

type RemoteCoordinator = SyncCoordinator<HttpVersionStore, HttpLockManager, InMemoryLocalStore>;

fn spawn_server(lock_ttl: Duration) -> String {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let state = HttpState::new(
                Arc::new(InMemoryVersionStore::new()),
                Arc::new(InMemoryLockManager::with_ttl(lock_ttl)),
            );
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, http::router(state)).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

/// An address nothing listens on.
fn dead_address() -> String {
    let listener = StdListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Accepts connections and never answers.
fn silent_address() -> String {
    let listener = StdListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    format!("http://{}", addr)
}

fn remote_coordinator(base: &str) -> RemoteCoordinator {
    SyncCoordinator::new(
        HttpVersionStore::new(base).unwrap(),
        HttpLockManager::connect(base).unwrap(),
        InMemoryLocalStore::new(),
    )
}

fn tables(names: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "tables": names })).unwrap()
}

#[test]
fn stale_editor_gets_a_conflict_from_the_server() {
    let base = spawn_server(Duration::from_secs(60));
    let sync = remote_coordinator(&base);
    let a = SessionId::from("session-a");
    let b = SessionId::from("session-b");

    let created = sync.save_document(None, tables(&[]), &a).unwrap();
    assert!(created.is_saved());
    let id = created.document_id().to_string();
    assert_eq!(id.len(), 20);

    assert_eq!(
        sync.save_document_from(&id, 1, tables(&["users"]), &a)
            .unwrap(),
        SaveOutcome::Saved {
            document_id: id.clone(),
            version: 2
        }
    );
    assert_eq!(
        sync.save_document_from(&id, 1, tables(&["orders"]), &b)
            .unwrap(),
        SaveOutcome::Conflict {
            document_id: id.clone(),
            current_version: 2,
            current_content: tables(&["users"]),
        }
    );

    let doc = sync.load_document(&id).unwrap();
    assert!(!doc.local);
    assert_eq!(doc.version, 2);
    assert_eq!(doc.last_modified_by, Some(a));
    assert!(sync.locks().holder(&id).unwrap().is_none());
}

#[test]
fn conditional_write_conflict_carries_current_state() {
    let base = spawn_server(Duration::from_secs(60));
    let store = HttpVersionStore::new(&base).unwrap();
    let id = store.create(b"one".to_vec()).unwrap().id;
    store
        .conditional_write(&id, b"two".to_vec(), Some(1), None)
        .unwrap();

    assert_eq!(
        store.conditional_write(&id, b"three".to_vec(), Some(1), None),
        Err(StoreError::VersionConflict {
            id: id.clone(),
            expected: 1,
            current_version: 2,
            current_content: b"two".to_vec(),
        })
    );
    assert_eq!(
        store.read("missing"),
        Err(StoreError::NotFound("missing".into()))
    );
}

#[test]
fn lock_errors_map_back_from_status_codes() {
    let base = spawn_server(Duration::from_secs(60));
    let locks = HttpLockManager::connect(&base).unwrap();
    assert_eq!(locks.ttl(), Duration::from_secs(60));
    let a = SessionId::from("session-a");
    let b = SessionId::from("session-b");

    let token = locks.acquire("doc-1", &a).unwrap();
    assert_eq!(token.holder, a);
    assert!(token.expires_at > token.acquired_at);
    assert_eq!(locks.holder("doc-1").unwrap().unwrap().holder, a);

    assert_eq!(
        locks.acquire("doc-1", &b),
        Err(LockError::Held {
            document_id: "doc-1".into(),
            holder: a.clone(),
        })
    );
    assert_eq!(
        locks.release("doc-1", &b),
        Err(LockError::NotHolder {
            document_id: "doc-1".into(),
            holder: a.clone(),
        })
    );

    locks.heartbeat("doc-1", &a).unwrap();
    locks.release("doc-1", &a).unwrap();
    assert_eq!(locks.holder("doc-1").unwrap(), None);
    assert_eq!(
        locks.heartbeat("doc-1", &a),
        Err(LockError::NotFound("doc-1".into()))
    );
}

#[test]
fn busy_document_is_refused_over_http() {
    let base = spawn_server(Duration::from_secs(60));
    let sync = remote_coordinator(&base);
    let a = SessionId::from("session-a");
    let b = SessionId::from("session-b");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    let edit = sync.begin_edit_session(&id, &a).unwrap();
    assert_eq!(
        sync.save_document(Some(&id), tables(&["orders"]), &b),
        Err(SyncError::LockHeld {
            document_id: id.clone(),
            holder: a.clone(),
        })
    );
    sync.end_edit_session(edit);
    assert!(sync
        .save_document(Some(&id), tables(&["orders"]), &b)
        .unwrap()
        .is_saved());
}

#[test]
fn edit_session_heartbeat_uses_the_server_ttl() {
    let ttl = Duration::from_millis(300);
    let base = spawn_server(ttl);
    let sync = remote_coordinator(&base);
    assert_eq!(sync.heartbeat_interval(), ttl / 3);

    let a = SessionId::from("session-a");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    let edit = sync.begin_edit_session(&id, &a).unwrap();
    thread::sleep(ttl * 3);

    let other = HttpLockManager::new(&base).unwrap();
    assert!(matches!(
        other.acquire(&id, &SessionId::from("session-b")),
        Err(LockError::Held { .. })
    ));
    let stats = edit.end();
    assert!(stats.beats >= 3, "beats = {}", stats.beats);
    assert_eq!(stats.failures, 0);
}

#[test]
fn snapshots_round_trip_through_the_client() {
    let base = spawn_server(Duration::from_secs(60));
    let sync = remote_coordinator(&base);
    let a = SessionId::from("session-a");
    let id = sync
        .save_document(None, b"first".to_vec(), &a)
        .unwrap()
        .document_id()
        .to_string();

    let snap = sync.create_snapshot(&id, Some("before refactor")).unwrap();
    assert_eq!(snap.document_id, id);
    assert_eq!(snap.version_number, 1);
    sync.save_document(Some(&id), b"second".to_vec(), &a).unwrap();

    let history = sync.list_snapshots(&id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].label.as_deref(), Some("before refactor"));
    assert_eq!(history[0].document_version, 1);
    assert_eq!(history[0].content, b"first");

    assert_eq!(sync.restore_snapshot(&id, 1).unwrap(), b"first");
    assert!(matches!(
        sync.restore_snapshot(&id, 9),
        Err(SyncError::NotFound(_))
    ));

    sync.delete_document(&id).unwrap();
    assert!(matches!(
        sync.load_document(&id),
        Err(SyncError::NotFound(_))
    ));
}

#[test]
fn dead_server_sends_edits_to_the_local_store() {
    let base = dead_address();
    let sync = SyncCoordinator::new(
        HttpVersionStore::new(&base).unwrap(),
        HttpLockManager::new(&base).unwrap(),
        InMemoryLocalStore::new(),
    );
    let a = SessionId::from("session-a");

    let created = sync.save_document(None, tables(&["users"]), &a).unwrap();
    let local_id = match &created {
        SaveOutcome::LocalFallback { local_id } => local_id.clone(),
        other => panic!("expected local fallback, got {:?}", other),
    };
    let doc = sync.load_document(&local_id).unwrap();
    assert!(doc.local);
    assert_eq!(doc.content, tables(&["users"]));

    // A known remote id: the lock call is refused, the edit still lands.
    let outcome = sync
        .save_document(Some("abcdefghij0123456789"), tables(&["orders"]), &a)
        .unwrap();
    assert!(outcome.is_local());
    assert_ne!(outcome.document_id(), local_id);

    assert!(matches!(
        sync.store().read("abcdefghij0123456789"),
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(
        HttpLockManager::connect(&base),
        Err(LockError::Unavailable(_))
    ));
}

#[test]
fn silent_server_times_out_into_the_local_store() {
    let base = silent_address();
    let store = HttpVersionStore::with_timeout(&base, Duration::from_millis(200)).unwrap();
    assert!(matches!(store.read("doc-1"), Err(StoreError::Timeout(_))));

    let sync = SyncCoordinator::new(
        store,
        HttpLockManager::new(&base)
            .unwrap()
            .with_timeout(Duration::from_millis(200))
            .unwrap(),
        InMemoryLocalStore::new(),
    );
    let a = SessionId::from("session-a");
    assert!(sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .is_local());
    assert!(sync
        .save_document(Some("abcdefghij0123456789"), tables(&[]), &a)
        .unwrap()
        .is_local());
}
