//! Row-source adapters that feed tables from external data.
//!
//! The engine consumes adapters through [`RowSource`] alone: a source hands
//! over its column names once, then yields typed rows until exhausted. How a
//! source obtains its data is its own business and its failures surface
//! unchanged as [`AdapterError`].

use thiserror::Error;

use crate::table::{CellValue, Table};

pub mod delimited;
pub mod query;

pub use delimited::{DelimitedOptions, DelimitedSource};
pub use query::QuerySource;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("delimiter {0:?} does not fit in one byte")]
    Delimiter(char),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A sequence of column names and typed rows, pulled from some external
/// data source.
pub trait RowSource {
    /// Column names in order. Empty means the source is headerless.
    fn columns(&mut self) -> Result<Vec<String>, AdapterError>;

    /// The next data row, or `None` once the source is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<CellValue>>, AdapterError>;
}

/// Drains a source into a fresh table: one header per column name, one
/// appended row per yielded row. The loaded table has no row open, so the
/// next `push_value` on it needs a `begin_row` first.
pub fn load(source: &mut dyn RowSource) -> Result<Table, AdapterError> {
    let mut table = Table::new();
    for column in source.columns()? {
        table.with_header(column);
    }
    let mut rows = 0usize;
    while let Some(row) = source.next_row()? {
        table.append_row(row);
        rows += 1;
    }
    tracing::debug!(id = %table.id(), rows, "Loaded table from row source");
    Ok(table)
}
