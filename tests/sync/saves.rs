use std::thread;

use docsync::{
    LockManager, ManualClock, SaveOutcome, SyncConfig, SyncCoordinator, SyncError, VersionStore,
};

use crate::support::{flaky_coordinator, session, tables, Fault, TTL};

#[test]
fn stale_editor_gets_conflict() {
    let sync = SyncCoordinator::in_memory(SyncConfig::default()).unwrap();
    let a = session("session-a");
    let b = session("session-b");

    let created = sync.save_document(None, tables(&[]), &a).unwrap();
    let id = created.document_id().to_string();
    assert_eq!(
        created,
        SaveOutcome::Saved {
            document_id: id.clone(),
            version: 1
        }
    );

    let saved = sync
        .save_document_from(&id, 1, tables(&["users"]), &a)
        .unwrap();
    assert_eq!(
        saved,
        SaveOutcome::Saved {
            document_id: id.clone(),
            version: 2
        }
    );

    // B loaded version 1 before A saved.
    match sync
        .save_document_from(&id, 1, tables(&["orders"]), &b)
        .unwrap()
    {
        SaveOutcome::Conflict {
            current_version,
            current_content,
            ..
        } => {
            assert_eq!(current_version, 2);
            assert_eq!(current_content, tables(&["users"]));
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    let doc = sync.load_document(&id).unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.content, tables(&["users"]));
    assert_eq!(doc.last_modified_by, Some(a));
    assert!(sync.locks().holder(&id).unwrap().is_none());
}

#[test]
fn plain_save_rereads_the_current_version() {
    let sync = SyncCoordinator::in_memory(SyncConfig::default()).unwrap();
    let a = session("session-a");
    let b = session("session-b");

    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();
    sync.save_document(Some(&id), tables(&["users"]), &a)
        .unwrap();

    let outcome = sync
        .save_document(Some(&id), tables(&["users", "orders"]), &b)
        .unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            document_id: id.clone(),
            version: 3
        }
    );
    assert_eq!(sync.load_document(&id).unwrap().last_modified_by, Some(b));
}

#[test]
fn save_is_refused_while_another_session_holds_the_lock() {
    let sync = SyncCoordinator::in_memory(SyncConfig::default()).unwrap();
    let a = session("session-a");
    let b = session("session-b");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    sync.locks().acquire(&id, &a).unwrap();

    let err = sync
        .save_document(Some(&id), tables(&["orders"]), &b)
        .unwrap_err();
    assert_eq!(
        err,
        SyncError::LockHeld {
            document_id: id.clone(),
            holder: a.clone()
        }
    );
    assert_eq!(err.status_code(), 423);

    // A's lock survives B's refused save; nothing was written.
    assert_eq!(sync.locks().holder(&id).unwrap().unwrap().holder, a);
    assert_eq!(sync.load_document(&id).unwrap().version, 1);
}

#[test]
fn missing_document_releases_the_lock() {
    let sync = SyncCoordinator::in_memory(SyncConfig::default()).unwrap();
    let a = session("session-a");

    let err = sync
        .save_document(Some("nosuchdocument"), tables(&[]), &a)
        .unwrap_err();
    assert_eq!(err, SyncError::NotFound("nosuchdocument".into()));
    assert!(sync.locks().holder("nosuchdocument").unwrap().is_none());
}

#[test]
fn failed_release_heals_after_ttl() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");
    let b = session("session-b");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    sync.locks().set_failing_release(true);
    let outcome = sync
        .save_document(Some(&id), tables(&["users"]), &a)
        .unwrap();
    assert!(outcome.is_saved());
    assert_eq!(sync.locks().inner().holder(&id).unwrap().unwrap().holder, a);

    assert!(matches!(
        sync.save_document(Some(&id), tables(&["orders"]), &b),
        Err(SyncError::LockHeld { .. })
    ));

    clock.advance(TTL);
    sync.locks().set_failing_release(false);
    let outcome = sync
        .save_document(Some(&id), tables(&["orders"]), &b)
        .unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            document_id: id.clone(),
            version: 3
        }
    );
}

#[test]
fn timed_out_write_that_landed_is_reported_saved() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    sync.store().set_fault(Fault::TimeoutAfterWrite);
    let outcome = sync
        .save_document(Some(&id), tables(&["users"]), &a)
        .unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            document_id: id.clone(),
            version: 2
        }
    );

    // Written exactly once.
    let record = sync.store().inner().read(&id).unwrap();
    assert_eq!(record.version, 2);
    assert_eq!(record.content, tables(&["users"]));
    assert!(sync.locks().inner().holder(&id).unwrap().is_none());
}

#[test]
fn timed_out_write_that_was_lost_is_retried() {
    let clock = ManualClock::new();
    let sync = flaky_coordinator(&clock);
    let a = session("session-a");
    let id = sync
        .save_document(None, tables(&[]), &a)
        .unwrap()
        .document_id()
        .to_string();

    sync.store().set_fault(Fault::TimeoutBeforeWrite);
    let outcome = sync
        .save_document(Some(&id), tables(&["users"]), &a)
        .unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Saved {
            document_id: id.clone(),
            version: 2
        }
    );
    assert_eq!(
        sync.store().inner().read(&id).unwrap().content,
        tables(&["users"])
    );
}

#[test]
fn concurrent_saves_never_lose_an_accepted_write() {
    let sync = SyncCoordinator::in_memory(SyncConfig::default()).unwrap();
    let owner = session("owner");
    let id = sync
        .save_document(None, tables(&[]), &owner)
        .unwrap()
        .document_id()
        .to_string();

    let outcomes: Vec<Result<SaveOutcome, SyncError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sync = &sync;
                let id = id.as_str();
                scope.spawn(move || {
                    let me = session(&format!("writer-{}", i));
                    let table = format!("t{}", i);
                    sync.save_document(Some(id), tables(&[table.as_str()]), &me)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let saved = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(SaveOutcome::Saved { .. })))
        .count();
    for outcome in &outcomes {
        assert!(
            matches!(
                outcome,
                Ok(SaveOutcome::Saved { .. }) | Err(SyncError::LockHeld { .. })
            ),
            "unexpected outcome {:?}",
            outcome
        );
    }
    assert!(saved >= 1);
    assert_eq!(sync.load_document(&id).unwrap().version, 1 + saved as u64);
    assert!(sync.locks().holder(&id).unwrap().is_none());
}
