//! Ordering and failure semantics of a full rotation.

use rotation_core::{resolve_range, RotationStep, RotationWorkflow, SpreadsheetHandle, StepError};
use rotation_test_utils::{Call, CallJournal, CallKind, FakeRemoteState, RecordingSpreadsheets};
use std::sync::Arc;

struct Harness {
    journal: CallJournal,
    spreadsheets: Arc<RecordingSpreadsheets>,
    remote: Arc<FakeRemoteState>,
    workflow: RotationWorkflow,
}

fn harness() -> Harness {
    let journal = CallJournal::new();
    let spreadsheets = Arc::new(RecordingSpreadsheets::new(journal.clone(), "new-sheet"));
    let remote = Arc::new(FakeRemoteState::new(journal.clone(), "old-sheet"));
    let workflow = RotationWorkflow::new(
        spreadsheets.clone(),
        remote.clone(),
        resolve_range("G3:V").unwrap(),
    );
    Harness {
        journal,
        spreadsheets,
        remote,
        workflow,
    }
}

fn old() -> SpreadsheetHandle {
    SpreadsheetHandle::new("old-sheet")
}

fn new() -> SpreadsheetHandle {
    SpreadsheetHandle::new("new-sheet")
}

#[tokio::test]
async fn successful_rotation_runs_every_step_in_order() {
    let mut h = harness();

    let outcome = h.workflow.run().await.expect("rotation should succeed");

    assert_eq!(outcome.previous, old());
    assert_eq!(outcome.active, new());
    assert_eq!(
        h.journal.calls(),
        vec![
            Call::GetActive,
            Call::ClearRange(old()),
            Call::Duplicate(old()),
            Call::SetActive(new()),
            Call::CopyPermissions {
                from: old(),
                to: new(),
            },
            Call::Delete(old()),
            Call::GetActive,
            Call::ClearTransients,
        ]
    );
    assert_eq!(h.workflow.current(), Some(&new()));
    assert_eq!(h.remote.active(), new());
    assert_eq!(h.spreadsheets.last_range(), Some(resolve_range("G3:V").unwrap()));
}

#[tokio::test]
async fn pointer_is_committed_before_delete() {
    let mut h = harness();
    h.workflow.run().await.unwrap();

    let set = h.journal.position(&Call::SetActive(new())).unwrap();
    let delete = h.journal.position(&Call::Delete(old())).unwrap();
    let purge = h.journal.position(&Call::ClearTransients).unwrap();

    assert!(set < delete);
    assert!(delete < purge);
    assert_eq!(h.journal.count(&Call::Delete(old())), 1);
    assert_eq!(h.journal.count(&Call::ClearTransients), 1);
}

#[tokio::test]
async fn delete_failure_keeps_candidate_active() {
    let mut h = harness();
    h.spreadsheets.fail_on(CallKind::Delete);

    let error = h.workflow.run().await.expect_err("delete should fail");

    assert_eq!(error.step, RotationStep::DeleteOld);
    assert!(matches!(error.source, StepError::Provider(_)));
    assert!(error.pointer_committed());
    assert_eq!(h.remote.active(), new());
    assert_eq!(h.journal.count(&Call::ClearTransients), 0);
    assert_eq!(h.workflow.current(), None);
}

#[tokio::test]
async fn clear_failure_aborts_before_copy() {
    let mut h = harness();
    h.spreadsheets.fail_on(CallKind::ClearRange);

    let error = h.workflow.run().await.unwrap_err();

    assert_eq!(error.step, RotationStep::Clear);
    assert!(!error.pointer_committed());
    assert_eq!(h.journal.calls(), vec![Call::GetActive, Call::ClearRange(old())]);
    assert_eq!(h.remote.active(), old());
}

#[tokio::test]
async fn permission_failure_aborts_before_delete() {
    let mut h = harness();
    h.spreadsheets.fail_on(CallKind::CopyPermissions);

    let error = h.workflow.run().await.unwrap_err();

    assert_eq!(error.step, RotationStep::CopyPermissions);
    assert_eq!(h.journal.count(&Call::Delete(old())), 0);
    assert_eq!(h.remote.active(), new());
}

#[tokio::test]
async fn pointer_update_failure_leaves_old_document() {
    let mut h = harness();
    h.remote.fail_on(CallKind::SetActive);

    let error = h.workflow.run().await.unwrap_err();

    assert_eq!(error.step, RotationStep::UpdatePointer);
    assert!(matches!(error.source, StepError::Remote(_)));
    assert_eq!(h.remote.active(), old());
    assert_eq!(h.journal.count(&Call::Delete(old())), 0);
}

#[tokio::test]
async fn read_failure_touches_nothing() {
    let mut h = harness();
    h.remote.fail_on(CallKind::GetActive);

    let error = h.workflow.run().await.unwrap_err();

    assert_eq!(error.step, RotationStep::ReadActive);
    assert_eq!(h.journal.calls(), vec![Call::GetActive]);
}

#[tokio::test]
async fn resync_adopts_concurrently_written_handle() {
    let mut h = harness();
    h.remote.overwrite_after_set("someone-else");

    let outcome = h.workflow.run().await.unwrap();

    assert_eq!(outcome.active, SpreadsheetHandle::new("someone-else"));
    assert_eq!(h.workflow.current(), Some(&SpreadsheetHandle::new("someone-else")));
}

#[tokio::test]
async fn transient_clear_failure_is_reported_after_resync() {
    let mut h = harness();
    h.remote.fail_on(CallKind::ClearTransients);

    let error = h.workflow.run().await.unwrap_err();

    assert_eq!(error.step, RotationStep::ClearTransients);
    assert_eq!(h.journal.count(&Call::Delete(old())), 1);
    assert_eq!(h.workflow.current(), Some(&new()));
}

#[tokio::test]
async fn each_run_starts_from_remote_state() {
    let mut h = harness();
    h.workflow.run().await.unwrap();
    h.workflow.run().await.unwrap();

    // second run rotates the document made by the first
    assert_eq!(h.journal.count(&Call::ClearRange(new())), 1);
    assert_eq!(h.journal.count(&Call::GetActive), 4);
}
