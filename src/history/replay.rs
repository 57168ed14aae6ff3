//! Deterministic reconstruction of a table from its call history.
//!
//! Replay never records: handlers dispatch to the untracked pure layer, so a
//! replayed operation cannot append to the history it is being rebuilt from.

use std::path::Path;

use thiserror::Error;

use crate::history::{ArgValue, CallLog, CallRecord};
use crate::ingest::{self, AdapterError, DelimitedOptions, DelimitedSource, QuerySource};
use crate::table::{Cell, Table, TableError, TableId};
use crate::transform;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("replay step {step} out of range (history length {len})")]
    InvalidStep { step: usize, len: usize },
    #[error("nothing to roll back")]
    NothingToRollBack,
    #[error("no replay handler for {component}/{operation}")]
    UnknownOperation {
        component: String,
        operation: String,
    },
    #[error("malformed record for {operation}: {reason}")]
    MalformedRecord { operation: String, reason: String },
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),
    #[error("history serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

type Handler = fn(Table, &CallRecord) -> Result<Table, HistoryError>;

/// Replay dispatch table, fixed at build time. Every trackable operation
/// registers exactly one handler keyed by (component, operation); nothing is
/// discovered at runtime.
static HANDLERS: &[(&str, &str, Handler)] = &[
    ("table", "with_title", replay_with_title),
    ("table", "with_header", replay_with_header),
    ("table", "begin_row", replay_begin_row),
    ("table", "push_value", replay_push_value),
    ("table", "apply", replay_apply),
    ("transform", "select", replay_select),
    ("transform", "sort", replay_sort),
    ("transform", "filter", replay_filter),
    ("transform", "join", replay_join),
    ("ingest", "delimited", replay_delimited),
    ("ingest", "query", replay_query),
];

fn handler_for(component: &str, operation: &str) -> Option<Handler> {
    HANDLERS
        .iter()
        .find(|(c, o, _)| *c == component && *o == operation)
        .map(|(_, _, handler)| *handler)
}

/// Rebuilds the table state after the first `step` records of `id`'s
/// history, starting from a fresh empty table. The result is re-tagged with
/// `id`: it answers for the identity it was built from.
///
/// Records whose live invocation failed are skipped; they changed nothing.
pub fn replay(log: &CallLog, id: TableId, step: usize) -> Result<Table, HistoryError> {
    let history = log.history_of(id);
    if step > history.len() {
        return Err(HistoryError::InvalidStep {
            step,
            len: history.len(),
        });
    }
    tracing::debug!(id = %id, step, len = history.len(), "Replaying history");

    let mut table = Table::new();
    for record in &history[..step] {
        if !record.succeeded {
            tracing::trace!(operation = %record.operation, "Skipping failed call");
            continue;
        }
        let handler = handler_for(&record.component, &record.operation).ok_or_else(|| {
            HistoryError::UnknownOperation {
                component: record.component.clone(),
                operation: record.operation.clone(),
            }
        })?;
        table = handler(table, record)?;
    }
    table.retag(id);
    Ok(table)
}

pub fn replay_all(log: &CallLog, id: TableId) -> Result<Table, HistoryError> {
    replay(log, id, log.len_of(id))
}

/// Undoes the most recent recorded operation by omission: replay of all but
/// the last record. The history itself is never pruned here, so repeated
/// calls re-derive the same prior state.
pub fn rollback(log: &CallLog, id: TableId) -> Result<Table, HistoryError> {
    let len = log.len_of(id);
    if len == 0 {
        return Err(HistoryError::NothingToRollBack);
    }
    replay(log, id, len - 1)
}

fn required<'a>(record: &'a CallRecord, name: &str) -> Result<&'a ArgValue, HistoryError> {
    record.arg(name).ok_or_else(|| HistoryError::MalformedRecord {
        operation: record.operation.clone(),
        reason: format!("missing argument `{name}`"),
    })
}

fn malformed(record: &CallRecord, reason: impl Into<String>) -> HistoryError {
    HistoryError::MalformedRecord {
        operation: record.operation.clone(),
        reason: reason.into(),
    }
}

fn replay_with_title(mut table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    match required(record, "title")? {
        ArgValue::Text(title) => {
            table.with_title(title.clone());
            Ok(table)
        }
        _ => Err(malformed(record, "`title` must be text")),
    }
}

fn replay_with_header(mut table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    match required(record, "header")? {
        ArgValue::Text(header) => {
            table.with_header(header.clone());
            Ok(table)
        }
        _ => Err(malformed(record, "`header` must be text")),
    }
}

fn replay_begin_row(mut table: Table, _record: &CallRecord) -> Result<Table, HistoryError> {
    table.begin_row();
    Ok(table)
}

fn replay_push_value(mut table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    match required(record, "value")? {
        ArgValue::Value(value) => {
            table.push_value(value.clone())?;
            Ok(table)
        }
        _ => Err(malformed(record, "`value` must be a cell value")),
    }
}

fn replay_apply(mut table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    match required(record, "cell")? {
        ArgValue::Cell {
            row,
            col,
            header,
            value,
        } => {
            let cell = Cell {
                row: *row,
                col: *col,
                header: header.clone(),
                value: value.clone(),
            };
            table.apply(&cell)?;
            Ok(table)
        }
        _ => Err(malformed(record, "`cell` must be a cell reference")),
    }
}

fn replay_select(table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    match required(record, "columns")? {
        ArgValue::Names(names) => Ok(transform::select(&table, names)?),
        _ => Err(malformed(record, "`columns` must be a name list")),
    }
}

fn replay_sort(table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    let column = match required(record, "column")? {
        ArgValue::Text(column) => column.clone(),
        _ => return Err(malformed(record, "`column` must be text")),
    };
    let order = match required(record, "order")? {
        ArgValue::Order(order) => *order,
        _ => return Err(malformed(record, "`order` must be a sort order")),
    };
    Ok(transform::sort(&table, &column, order)?)
}

fn replay_filter(table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    let column = match required(record, "column")? {
        ArgValue::Text(column) => column.clone(),
        _ => return Err(malformed(record, "`column` must be text")),
    };
    let pattern = match required(record, "pattern")? {
        ArgValue::Text(pattern) => pattern.clone(),
        _ => return Err(malformed(record, "`pattern` must be text")),
    };
    Ok(transform::filter(&table, &column, &pattern)?)
}

fn replay_join(table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    let right = match required(record, "right")? {
        ArgValue::Table(data) => data.clone().into_table(),
        _ => return Err(malformed(record, "`right` must be a table snapshot")),
    };
    let left_col = match required(record, "left_col")? {
        ArgValue::Index(index) => *index,
        _ => return Err(malformed(record, "`left_col` must be an index")),
    };
    let right_col = match required(record, "right_col")? {
        ArgValue::Index(index) => *index,
        _ => return Err(malformed(record, "`right_col` must be an index")),
    };
    Ok(transform::join(&table, &right, left_col, right_col)?)
}

// Ingest records re-run the load from the captured source address; the table
// under construction is discarded because a load begins an identity's
// history.
fn replay_delimited(_table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    let path = match required(record, "path")? {
        ArgValue::Text(path) => path.clone(),
        _ => return Err(malformed(record, "`path` must be text")),
    };
    let delimiter = match required(record, "delimiter")? {
        ArgValue::Text(text) => text
            .chars()
            .next()
            .ok_or_else(|| malformed(record, "`delimiter` must not be empty"))?,
        _ => return Err(malformed(record, "`delimiter` must be text")),
    };
    let has_headers = match required(record, "has_headers")? {
        ArgValue::Flag(flag) => *flag,
        _ => return Err(malformed(record, "`has_headers` must be a flag")),
    };
    let mut source = DelimitedSource::open(
        Path::new(&path),
        DelimitedOptions {
            delimiter,
            has_headers,
        },
    )?;
    Ok(ingest::load(&mut source)?)
}

fn replay_query(_table: Table, record: &CallRecord) -> Result<Table, HistoryError> {
    let path = match required(record, "path")? {
        ArgValue::Text(path) => path.clone(),
        _ => return Err(malformed(record, "`path` must be text")),
    };
    let sql = match required(record, "sql")? {
        ArgValue::Text(sql) => sql.clone(),
        _ => return Err(malformed(record, "`sql` must be text")),
    };
    let mut source = QuerySource::open(Path::new(&path), &sql)?;
    Ok(ingest::load(&mut source)?)
}
