//! Integration tests for the recorded-history workflow
//!
//! Tests the full loop of building a table through a tracked handle,
//! replaying its history, walking it back with rollback, and moving a
//! history between processes as a JSON document.

use std::sync::Arc;

use super::common::fixtures::tracked_people;
use turntable::{replay, replay_all, rollback, CallLog, CellValue, HistoryError, SortOrder, TrackedTable};

/// Test that replaying a full history renders byte-identical output to the
/// live sequence of calls.
#[test]
fn test_replay_is_byte_identical_to_live_calls() {
    let log = Arc::new(CallLog::new());
    let mut tracked = tracked_people(Arc::clone(&log));
    tracked
        .sort("score", SortOrder::Descending)
        .expect("sortable column");
    let live = tracked.table().to_text().expect("consistent arity");

    let replayed = replay_all(&log, tracked.id()).expect("replayable history");
    assert_eq!(replayed.to_text().expect("consistent arity"), live);
    assert_eq!(replayed.id(), tracked.id());
}

/// Test that replay prefixes rebuild the intermediate states in order.
#[test]
fn test_replay_prefixes_walk_through_intermediate_states() {
    let log = Arc::new(CallLog::new());
    let mut tracked = TrackedTable::new(Arc::clone(&log));
    tracked.with_header("n");
    for n in [10i64, 20, 30] {
        tracked.begin_row();
        tracked.push_value(n).expect("row begun");
    }

    // Steps: header, then (begin + push) per value.
    let at = |step: usize| replay(&log, tracked.id(), step).expect("valid step");
    assert_eq!(at(0).row_count(), 0);
    assert!(!at(0).has_headers());
    assert_eq!(at(1).headers(), &["n"]);
    assert_eq!(at(3).rows(), &[vec![CellValue::Integer(10)]][..]);
    assert_eq!(at(5).row_count(), 2);
    assert_eq!(at(7).row_count(), 3);

    let err = replay(&log, tracked.id(), 8).expect_err("past the end");
    assert!(matches!(err, HistoryError::InvalidStep { step: 8, len: 7 }));
}

/// Test the full rollback loop: n recorded operations allow exactly n
/// rollbacks, ending at the empty initial state, and replay_all restores
/// the full state afterwards.
#[test]
fn test_rollback_to_empty_then_replay_all_restores() {
    let log = Arc::new(CallLog::new());
    let mut tracked = tracked_people(Arc::clone(&log));
    let full = tracked.table().rows().to_vec();
    let recorded = tracked.history().len();
    assert_eq!(recorded, 15);

    for _ in 0..recorded {
        tracked.rollback().expect("history remains");
    }
    assert_eq!(tracked.table().row_count(), 0);
    assert!(!tracked.table().has_headers());

    let err = tracked.rollback().expect_err("nothing left to roll back");
    assert!(matches!(err, HistoryError::NothingToRollBack));

    // The log itself was never pruned.
    assert_eq!(log.len_of(tracked.id()), recorded);

    tracked.replay_all().expect("replayable history");
    assert_eq!(tracked.table().rows(), &full[..]);
}

/// Test that the log-level rollback is stateless: calling it repeatedly
/// yields the same next-to-last state and never shortens the history.
#[test]
fn test_log_level_rollback_is_stateless() {
    let log = Arc::new(CallLog::new());
    let tracked = tracked_people(Arc::clone(&log));
    let len = log.len_of(tracked.id());

    let first = rollback(&log, tracked.id()).expect("non-empty history");
    let second = rollback(&log, tracked.id()).expect("non-empty history");
    assert_eq!(first.rows(), second.rows());
    assert_eq!(log.len_of(tracked.id()), len);
}

/// Test that recording a new operation while rolled back discards the
/// undone tail, like an editor dropping its redo stack.
#[test]
fn test_new_operation_after_rollback_discards_undone_tail() {
    let log = Arc::new(CallLog::new());
    let mut tracked = TrackedTable::new(Arc::clone(&log));
    tracked.with_header("n");
    tracked.begin_row();
    tracked.push_value(1i64).expect("row begun");
    tracked.push_value(2i64).expect("row begun");
    assert_eq!(tracked.history().len(), 4);

    tracked.rollback().expect("history remains");
    tracked.rollback().expect("history remains");
    tracked.push_value(9i64).expect("row begun");

    let history = tracked.history();
    assert_eq!(history.len(), 3);
    assert_eq!(
        tracked.table().rows(),
        &[vec![CellValue::Integer(9)]][..]
    );

    tracked.replay_all().expect("replayable history");
    assert_eq!(
        tracked.table().rows(),
        &[vec![CellValue::Integer(9)]][..]
    );
}

/// Test that failed calls stay in the history but are skipped by replay.
#[test]
fn test_failed_calls_are_logged_but_skipped_on_replay() {
    let log = Arc::new(CallLog::new());
    let mut tracked = TrackedTable::new(Arc::clone(&log));
    tracked
        .push_value("too early")
        .expect_err("no row begun yet");
    tracked.with_header("n");
    tracked.begin_row();
    tracked.push_value(1i64).expect("row begun");

    let history = tracked.history();
    assert_eq!(history.len(), 4);
    assert!(!history[0].succeeded);

    let replayed = replay_all(&log, tracked.id()).expect("replayable history");
    assert_eq!(replayed.rows(), tracked.table().rows());
}

/// Test that a derivation chain keeps the handle identity while the log
/// records each derivation step.
#[test]
fn test_derivation_chain_keeps_identity_and_records_steps() {
    let log = Arc::new(CallLog::new());
    let mut tracked = tracked_people(Arc::clone(&log));
    let id = tracked.id();

    tracked.select(&["name", "score"]).expect("known columns");
    tracked
        .sort("name", SortOrder::Ascending)
        .expect("sortable column");
    tracked.filter("name", "a.*|b.*").expect("valid pattern");

    assert_eq!(tracked.id(), id);
    assert_eq!(tracked.table().headers(), &["name", "score"]);
    assert_eq!(
        tracked.table().values_by_name("name").expect("known column"),
        vec![
            CellValue::Text("alice".to_string()),
            CellValue::Text("bob".to_string())
        ]
    );

    let tail: Vec<String> = tracked
        .history()
        .iter()
        .rev()
        .take(3)
        .map(|r| format!("{}/{}", r.component, r.operation))
        .collect();
    assert_eq!(tail, ["transform/filter", "transform/sort", "transform/select"]);
}

/// Test that an exported history rebuilds the same table under a fresh
/// identity in another log.
#[test]
fn test_export_then_import_reconstructs_the_table() {
    let log = Arc::new(CallLog::new());
    let mut tracked = tracked_people(Arc::clone(&log));
    tracked
        .sort("id", SortOrder::Ascending)
        .expect("sortable column");
    let exported = tracked.export_history().expect("serializable history");

    let other_log = Arc::new(CallLog::new());
    let imported =
        TrackedTable::import_history(&exported, Arc::clone(&other_log)).expect("valid document");

    assert_eq!(imported.table().headers(), tracked.table().headers());
    assert_eq!(imported.table().rows(), tracked.table().rows());

    // The imported lineage keeps working: it can be extended and rolled back.
    let mut imported = imported;
    imported.begin_row();
    imported.push_value(4i64).expect("row begun");
    imported.push_value("dan").expect("row begun");
    imported.push_value(5.0f64).expect("row begun");
    assert_eq!(imported.table().row_count(), 4);
    imported.rollback().expect("history remains");
}

/// Test that a history holding non-finite floats still exports to JSON and
/// imports back, with the values intact in the rebuilt table.
#[test]
fn test_exported_nan_values_import_back() {
    let log = Arc::new(CallLog::new());
    let mut tracked = TrackedTable::new(Arc::clone(&log));
    tracked.with_header("reading");
    tracked.begin_row();
    tracked.push_value(f64::NAN).expect("row begun");
    tracked.begin_row();
    tracked.push_value(f64::INFINITY).expect("row begun");

    let exported = tracked.export_history().expect("serializable history");
    let imported = TrackedTable::import_history(&exported, Arc::new(CallLog::new()))
        .expect("non-finite values survive the document");

    match &imported.table().rows()[0][0] {
        CellValue::Float(v) => assert!(v.is_nan()),
        other => panic!("expected float, got {other:?}"),
    }
    assert_eq!(
        imported.table().rows()[1][0],
        CellValue::Float(f64::INFINITY)
    );
}
