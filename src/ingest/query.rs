//! SQLite query results as a [`RowSource`].

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::ingest::{AdapterError, RowSource};
use crate::table::CellValue;

/// Buffered result set of one SQL statement. Rows are read eagerly at open
/// time: rusqlite rows borrow their statement, and buffering lets the source
/// outlive both the statement and the connection that produced it.
#[derive(Debug)]
pub struct QuerySource {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<CellValue>>,
}

impl QuerySource {
    /// Opens the database file and runs the statement.
    pub fn open(db_path: &Path, sql: &str) -> Result<Self, AdapterError> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(&conn, sql)
    }

    /// Runs the statement on a connection the caller already holds. A
    /// borrowed connection cannot be reconstructed later, so tables built
    /// this way are not replayable from their history.
    pub fn from_connection(conn: &Connection, sql: &str) -> Result<Self, AdapterError> {
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let column_count = columns.len();

        let mut buffered = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                values.push(cell_from_sql(row.get_ref(index)?));
            }
            buffered.push(values);
        }

        Ok(Self {
            columns,
            rows: buffered.into_iter(),
        })
    }
}

impl RowSource for QuerySource {
    fn columns(&mut self) -> Result<Vec<String>, AdapterError> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<Option<Vec<CellValue>>, AdapterError> {
        Ok(self.rows.next())
    }
}

/// SQLite's storage classes mapped onto cell values. NULL becomes empty
/// text and BLOBs are decoded as lossy UTF-8; there is no richer value to
/// map either onto.
fn cell_from_sql(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Text(String::new()),
        ValueRef::Integer(i) => CellValue::Integer(i),
        ValueRef::Real(f) => CellValue::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
