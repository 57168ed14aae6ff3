use std::path::Path;
use std::sync::Arc;

use crate::history::replay::{self, HistoryError};
use crate::history::{ArgValue, CallArg, CallLog, CallRecord};
use crate::ingest::{self, DelimitedOptions, DelimitedSource, QuerySource};
use crate::table::{Cell, CellValue, Table, TableError, TableId};
use crate::transform::{self, SortOrder};

/// A table handle that records every trackable operation into a shared
/// [`CallLog`] before the caller sees the result.
///
/// Each wrapper captures its concrete argument values, invokes the untracked
/// operation, then appends one [`CallRecord`] carrying the observed outcome;
/// failed calls are recorded too, with the table left untouched. Successful
/// transformations are re-tagged with this handle's identity and replace the
/// inner table, so the log explicitly records the derivation chain that
/// produced the identity's current state.
///
/// Rollback and replay are never recorded. The handle keeps a replay cursor
/// so repeated rollback walks one recorded operation at a time back to the
/// empty initial state; recording a new operation while rolled back first
/// truncates the undone tail, the way an editor discards its redo stack.
#[derive(Debug)]
pub struct TrackedTable {
    table: Table,
    log: Arc<CallLog>,
    cursor: Option<usize>,
}

impl TrackedTable {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            table: Table::new(),
            log,
            cursor: None,
        }
    }

    /// Wraps an existing table without recording anything. Whatever produced
    /// the table is not replayable history; tracking starts from here.
    pub fn adopt(table: Table, log: Arc<CallLog>) -> Self {
        Self {
            table,
            log,
            cursor: None,
        }
    }

    /// Loads a delimited file and records the load, so the table can be
    /// rebuilt from its path and options alone.
    pub fn from_delimited(
        path: &Path,
        options: DelimitedOptions,
        log: Arc<CallLog>,
    ) -> Result<Self, HistoryError> {
        let mut source = DelimitedSource::open(path, options)?;
        let table = ingest::load(&mut source)?;
        log.record(
            table.id(),
            CallRecord::new(
                "ingest",
                "delimited",
                true,
                vec![
                    CallArg::new("path", ArgValue::Text(path.display().to_string())),
                    CallArg::new("delimiter", ArgValue::Text(options.delimiter.to_string())),
                    CallArg::new("has_headers", ArgValue::Flag(options.has_headers)),
                ],
            ),
        );
        Ok(Self {
            table,
            log,
            cursor: None,
        })
    }

    /// Runs a query against a SQLite database file and records the load.
    /// Only the path form is trackable; a borrowed connection is ambient
    /// state replay could not reconstruct, so query results arriving that
    /// way must come in through [`TrackedTable::adopt`].
    pub fn from_query(
        db_path: &Path,
        sql: &str,
        log: Arc<CallLog>,
    ) -> Result<Self, HistoryError> {
        let mut source = QuerySource::open(db_path, sql)?;
        let table = ingest::load(&mut source)?;
        log.record(
            table.id(),
            CallRecord::new(
                "ingest",
                "query",
                true,
                vec![
                    CallArg::new("path", ArgValue::Text(db_path.display().to_string())),
                    CallArg::new("sql", ArgValue::Text(sql.to_string())),
                ],
            ),
        );
        Ok(Self {
            table,
            log,
            cursor: None,
        })
    }

    /// Reconstructs a table from an exported history document: a fresh
    /// identity is minted, the records are appended verbatim, and the state
    /// is rebuilt by replaying all of them.
    pub fn import_history(json: &str, log: Arc<CallLog>) -> Result<Self, HistoryError> {
        let records: Vec<CallRecord> = serde_json::from_str(json)?;
        let id = TableId::fresh();
        for record in records {
            log.record(id, record);
        }
        let table = replay::replay_all(&log, id)?;
        Ok(Self {
            table,
            log,
            cursor: None,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn id(&self) -> TableId {
        self.table.id()
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn history(&self) -> Vec<CallRecord> {
        self.log.history_of(self.table.id())
    }

    pub fn export_history(&self) -> Result<String, serde_json::Error> {
        self.log.export(self.table.id())
    }

    pub fn with_title(&mut self, title: impl Into<String>) -> &mut Self {
        let title = title.into();
        self.table.with_title(title.clone());
        self.commit(
            "table",
            "with_title",
            true,
            vec![CallArg::new("title", ArgValue::Text(title))],
        );
        self
    }

    pub fn with_header(&mut self, header: impl Into<String>) -> &mut Self {
        let header = header.into();
        self.table.with_header(header.clone());
        self.commit(
            "table",
            "with_header",
            true,
            vec![CallArg::new("header", ArgValue::Text(header))],
        );
        self
    }

    pub fn begin_row(&mut self) -> &mut Self {
        self.table.begin_row();
        self.commit("table", "begin_row", true, Vec::new());
        self
    }

    pub fn push_value(&mut self, value: impl Into<CellValue>) -> Result<&mut Self, TableError> {
        let value = value.into();
        let result = self.table.push_value(value.clone()).map(|_| ());
        self.commit(
            "table",
            "push_value",
            result.is_ok(),
            vec![CallArg::new("value", ArgValue::Value(value))],
        );
        result.map(|()| self)
    }

    pub fn apply(&mut self, cell: &Cell) -> Result<(), TableError> {
        let result = self.table.apply(cell);
        self.commit(
            "table",
            "apply",
            result.is_ok(),
            vec![CallArg::new(
                "cell",
                ArgValue::Cell {
                    row: cell.row,
                    col: cell.col,
                    header: cell.header.clone(),
                    value: cell.value.clone(),
                },
            )],
        );
        result
    }

    pub fn select<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<&mut Self, TableError> {
        let names: Vec<String> = columns.iter().map(|s| s.as_ref().to_string()).collect();
        let result = transform::select(&self.table, &names);
        let succeeded = result.is_ok();
        self.commit(
            "transform",
            "select",
            succeeded,
            vec![CallArg::new("columns", ArgValue::Names(names))],
        );
        self.adopt_derived(result)
    }

    pub fn sort(&mut self, column: &str, order: SortOrder) -> Result<&mut Self, TableError> {
        let result = transform::sort(&self.table, column, order);
        let succeeded = result.is_ok();
        self.commit(
            "transform",
            "sort",
            succeeded,
            vec![
                CallArg::new("column", ArgValue::Text(column.to_string())),
                CallArg::new("order", ArgValue::Order(order)),
            ],
        );
        self.adopt_derived(result)
    }

    pub fn filter(&mut self, column: &str, pattern: &str) -> Result<&mut Self, TableError> {
        let result = transform::filter(&self.table, column, pattern);
        let succeeded = result.is_ok();
        self.commit(
            "transform",
            "filter",
            succeeded,
            vec![
                CallArg::new("column", ArgValue::Text(column.to_string())),
                CallArg::new("pattern", ArgValue::Text(pattern.to_string())),
            ],
        );
        self.adopt_derived(result)
    }

    /// Equi-join with another table. The right side is captured as a full
    /// snapshot in the record, so replay does not depend on that table still
    /// existing.
    pub fn join(
        &mut self,
        right: &Table,
        left_col: usize,
        right_col: usize,
    ) -> Result<&mut Self, TableError> {
        let result = transform::join(&self.table, right, left_col, right_col);
        let succeeded = result.is_ok();
        self.commit(
            "transform",
            "join",
            succeeded,
            vec![
                CallArg::new("right", ArgValue::Table(right.snapshot())),
                CallArg::new("left_col", ArgValue::Index(left_col)),
                CallArg::new("right_col", ArgValue::Index(right_col)),
            ],
        );
        self.adopt_derived(result)
    }

    /// Steps back one recorded operation: the state becomes a replay of all
    /// but the most recent kept record. Fails with `NothingToRollBack` once
    /// the empty initial state is reached.
    pub fn rollback(&mut self) -> Result<(), HistoryError> {
        let len = self.log.len_of(self.table.id());
        let effective = self.cursor.unwrap_or(len);
        if effective == 0 {
            return Err(HistoryError::NothingToRollBack);
        }
        let step = effective - 1;
        self.table = replay::replay(&self.log, self.table.id(), step)?;
        self.cursor = Some(step);
        Ok(())
    }

    /// Rebuilds the state as of the first `step` recorded operations.
    pub fn replay(&mut self, step: usize) -> Result<(), HistoryError> {
        self.table = replay::replay(&self.log, self.table.id(), step)?;
        let len = self.log.len_of(self.table.id());
        self.cursor = if step == len { None } else { Some(step) };
        Ok(())
    }

    /// Rebuilds the full recorded state, clearing any rollback position.
    pub fn replay_all(&mut self) -> Result<(), HistoryError> {
        self.table = replay::replay_all(&self.log, self.table.id())?;
        self.cursor = None;
        Ok(())
    }

    fn commit(&mut self, component: &str, operation: &str, succeeded: bool, args: Vec<CallArg>) {
        if let Some(cursor) = self.cursor.take() {
            self.log.truncate(self.table.id(), cursor);
        }
        self.log.record(
            self.table.id(),
            CallRecord::new(component, operation, succeeded, args),
        );
    }

    fn adopt_derived(&mut self, result: Result<Table, TableError>) -> Result<&mut Self, TableError> {
        match result {
            Ok(mut derived) => {
                derived.retag(self.table.id());
                self.table = derived;
                Ok(self)
            }
            Err(e) => Err(e),
        }
    }
}
