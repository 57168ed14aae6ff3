//! Shared table and file fixtures for the integration suite.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use turntable::{CallLog, CellValue, TrackedTable};

/// Writes `contents` under the test's temp dir and returns the path.
pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).expect("Failed to create fixture file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write fixture file");
    path
}

pub fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

/// Builds the three-column sample through a tracked handle so every step
/// lands in the log.
pub fn tracked_people(log: Arc<CallLog>) -> TrackedTable {
    let mut tracked = TrackedTable::new(log);
    tracked
        .with_header("id")
        .with_header("name")
        .with_header("score");
    for (id, name, score) in [(2i64, "bob", 7.0f64), (1, "alice", 9.5), (3, "eve", 7.0)] {
        tracked.begin_row();
        tracked.push_value(id).expect("row begun");
        tracked.push_value(name).expect("row begun");
        tracked.push_value(score).expect("row begun");
    }
    tracked
}
