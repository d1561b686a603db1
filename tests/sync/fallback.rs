use docsync::{
    is_local_id, LocalFilter, LocalStore, LockManager, ManualClock, SaveOutcome, SyncError,
    VersionStore, DEFAULT_LOCAL_PREFIX,
};

use crate::support::{flaky_coordinator, session, tables, Fault};

#[test]
fn unreachable_create_lands_locally() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");

    sync.store().set_fault(Fault::Unavailable);
    let outcome = sync.save_document(None, tables(&["users"]), &a).unwrap();
    let local_id = match outcome {
        SaveOutcome::LocalFallback { local_id } => local_id,
        other => panic!("expected local fallback, got {:?}", other),
    };
    assert!(is_local_id(&local_id, DEFAULT_LOCAL_PREFIX));

    // Served from the local store only.
    let calls = sync.store().calls();
    let doc = sync.load_document(&local_id).unwrap();
    assert!(doc.local);
    assert_eq!(doc.version, 1);
    assert_eq!(doc.content, tables(&["users"]));
    assert_eq!(sync.store().calls(), calls);
}

#[test]
fn local_documents_bypass_locks_and_versions() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");
    let local_id = sync.local().create(tables(&[])).unwrap();

    sync.locks().set_down(true);
    let calls = sync.store().calls();

    let outcome = sync
        .save_document(Some(&local_id), tables(&["users"]), &a)
        .unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::LocalFallback {
            local_id: local_id.clone()
        }
    );
    assert_eq!(sync.load_document(&local_id).unwrap().content, tables(&["users"]));
    assert_eq!(sync.store().calls(), calls);

    // No history for local documents.
    assert!(sync.list_snapshots(&local_id).unwrap().is_empty());
    assert!(matches!(
        sync.create_snapshot(&local_id, None),
        Err(SyncError::NotFound(_))
    ));
}

#[test]
fn unreachable_store_mid_save_keeps_the_edit() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    sync.store().set_fault(Fault::Unavailable);
    let outcome = sync
        .save_document(Some(&id), tables(&["users"]), &a)
        .unwrap();
    assert!(outcome.is_local());
    assert_ne!(outcome.document_id(), id);
    assert_eq!(
        sync.local().read(outcome.document_id()).unwrap(),
        tables(&["users"])
    );

    // The lock was still released, and the remote copy is untouched.
    assert!(sync.locks().inner().holder(&id).unwrap().is_none());
    sync.store().set_fault(Fault::None);
    assert_eq!(sync.store().read(&id).unwrap().version, 1);
}

#[test]
fn unreachable_lock_service_keeps_the_edit() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    sync.locks().set_down(true);
    let outcome = sync
        .save_document(Some(&id), tables(&["orders"]), &a)
        .unwrap();
    assert!(outcome.is_local());
    assert_eq!(
        sync.load_document(outcome.document_id()).unwrap().content,
        tables(&["orders"])
    );
}

#[test]
fn fallback_copies_are_listed_and_deletable() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");

    sync.store().set_fault(Fault::Unavailable);
    let diagram = |title: &str| {
        serde_json::to_vec(&serde_json::json!({ "title": title, "tables": [] })).unwrap()
    };
    let first = sync.save_document(None, diagram("Shop"), &a).unwrap();
    let second = sync.save_document(None, diagram("Blog"), &a).unwrap();

    let page = sync.local().list(&LocalFilter::all()).unwrap();
    assert_eq!(page.total, 2);
    let titles: Vec<_> = page.items.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Shop", "Blog"]);

    sync.delete_document(first.document_id()).unwrap();
    assert!(matches!(
        sync.load_document(first.document_id()),
        Err(SyncError::NotFound(_))
    ));
    let page = sync.local().list(&LocalFilter::all().search("blog")).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, second.document_id());
}
