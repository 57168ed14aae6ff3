//! Property-based checks for the transformation and replay guarantees
//!
//! Exercises the algebraic promises: stable sorting with descending as the
//! exact reverse, idempotent filtering, projection purity, and replay
//! reproducing live state for arbitrary histories.

use std::sync::Arc;

use proptest::prelude::*;
use turntable::{
    filter, replay_all, select, sort, CallLog, CellValue, SortOrder, Table, TrackedTable,
};

/// Two-column table: the generated keys plus their original positions.
fn keyed_table(values: &[i64]) -> Table {
    let mut table = Table::new();
    table.with_header("k").with_header("ord");
    for (i, v) in values.iter().enumerate() {
        table.begin_row();
        table.push_value(*v).expect("row begun");
        table.push_value(i as i64).expect("row begun");
    }
    table
}

fn ints(table: &Table, name: &str) -> Vec<i64> {
    table
        .values_by_name(name)
        .expect("known column")
        .into_iter()
        .map(|v| match v {
            CellValue::Integer(i) => i,
            other => panic!("expected integer, got {other:?}"),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_sort_ascending_is_ordered_and_stable(
        values in prop::collection::vec(0i64..5, 0..24)
    ) {
        let table = keyed_table(&values);
        let sorted = sort(&table, "k", SortOrder::Ascending).expect("comparable keys");

        let keys = ints(&sorted, "k");
        let ords = ints(&sorted, "ord");
        for i in 1..keys.len() {
            prop_assert!(keys[i - 1] <= keys[i], "keys out of order at {}", i);
            if keys[i - 1] == keys[i] {
                prop_assert!(ords[i - 1] < ords[i], "equal keys reordered at {}", i);
            }
        }
    }

    #[test]
    fn prop_descending_is_the_exact_reverse_of_ascending(
        values in prop::collection::vec(0i64..5, 0..24)
    ) {
        let table = keyed_table(&values);
        let asc = sort(&table, "k", SortOrder::Ascending).expect("comparable keys");
        let desc = sort(&table, "k", SortOrder::Descending).expect("comparable keys");

        let mut reversed = asc.rows().to_vec();
        reversed.reverse();
        prop_assert_eq!(desc.rows(), &reversed[..]);
    }

    #[test]
    fn prop_filter_is_idempotent(
        values in prop::collection::vec(0i64..10, 0..24)
    ) {
        let table = keyed_table(&values);
        let once = filter(&table, "k", "[0-4]").expect("valid pattern");
        let twice = filter(&once, "k", "[0-4]").expect("valid pattern");
        prop_assert_eq!(twice.rows(), once.rows());
    }

    #[test]
    fn prop_select_is_a_pure_projection(
        values in prop::collection::vec(-50i64..50, 0..24)
    ) {
        let table = keyed_table(&values);
        let projected = select(&table, &["ord", "k"]).expect("known columns");

        prop_assert_eq!(projected.headers(), &["ord", "k"]);
        prop_assert_eq!(ints(&projected, "k"), ints(&table, "k"));
        prop_assert_eq!(ints(&projected, "ord"), ints(&table, "ord"));
    }

    #[test]
    fn prop_replay_reproduces_any_live_history(
        values in prop::collection::vec(-9i64..9, 0..16),
        do_sort in any::<bool>()
    ) {
        let log = Arc::new(CallLog::new());
        let mut tracked = TrackedTable::new(Arc::clone(&log));
        tracked.with_header("k");
        for v in &values {
            tracked.begin_row();
            tracked.push_value(*v).expect("row begun");
        }
        if do_sort {
            tracked.sort("k", SortOrder::Ascending).expect("comparable keys");
        }

        let replayed = replay_all(&log, tracked.id()).expect("replayable history");
        prop_assert_eq!(replayed.headers(), tracked.table().headers());
        prop_assert_eq!(replayed.rows(), tracked.table().rows());
    }

    #[test]
    fn prop_replay_all_restores_any_rollback_depth(
        values in prop::collection::vec(0i64..100, 1..10),
        seed in any::<u64>()
    ) {
        let log = Arc::new(CallLog::new());
        let mut tracked = TrackedTable::new(Arc::clone(&log));
        tracked.with_header("k");
        for v in &values {
            tracked.begin_row();
            tracked.push_value(*v).expect("row begun");
        }
        let full = tracked.table().rows().to_vec();

        let recorded = 1 + 2 * values.len();
        let depth = (seed as usize) % (recorded + 1);
        for _ in 0..depth {
            tracked.rollback().expect("history remains");
        }

        tracked.replay_all().expect("replayable history");
        prop_assert_eq!(tracked.table().rows(), &full[..]);
    }
}
