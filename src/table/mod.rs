mod cell;
mod render;
mod value;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cell::Cell;
pub use value::CellValue;

#[derive(Debug, Error)]
pub enum TableError {
    /// Row length disagrees with the header count. Detected lazily at
    /// header-qualified access or rendering, never padded or truncated.
    #[error("row {row} has {actual} values but the table has {expected} headers")]
    InconsistentArity {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("no row started; call begin_row before pushing values")]
    NoRowStarted,
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("cannot compare {left} with {right}")]
    IncomparableValues {
        left: &'static str,
        right: &'static str,
    },
    #[error("invalid filter pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Table identity: wall-clock milliseconds plus random low bits, unique
/// enough within one process to key per-table history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(u64);

impl TableId {
    pub(crate) fn fresh() -> Self {
        Self(now_ms() + rand::rng().random_range(0..1000))
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The serde carrier for a table snapshot: everything but identity and the
/// row-under-construction marker. Turning a snapshot back into a table mints
/// a fresh id; a snapshot has no attached history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl TableData {
    pub fn into_table(self) -> Table {
        Table {
            id: TableId::fresh(),
            title: self.title,
            headers: self.headers,
            rows: self.rows,
            current_row: None,
        }
    }
}

/// An in-memory table: identity, optional title, optional header row, and
/// ordered rows of [`CellValue`]s.
///
/// Rows are built incrementally (`begin_row` then `push_value`), so a row
/// shorter than the header count is a legitimate transient state. The arity
/// invariant is enforced only where columnar meaning is needed: named column
/// access and rendering.
#[derive(Debug, Clone)]
pub struct Table {
    id: TableId,
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    current_row: Option<usize>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            id: TableId::fresh(),
            title: None,
            headers: Vec::new(),
            rows: Vec::new(),
            current_row: None,
        }
    }

    pub fn with_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    /// Appends a header. Duplicate names are allowed; name lookups resolve
    /// to the first occurrence.
    pub fn with_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.headers.push(header.into());
        self
    }

    /// Appends an empty row and makes it the row under construction.
    pub fn begin_row(&mut self) -> &mut Self {
        self.rows.push(Vec::new());
        self.current_row = Some(self.rows.len() - 1);
        self
    }

    pub fn push_value(&mut self, value: impl Into<CellValue>) -> Result<&mut Self, TableError> {
        let index = self.current_row.ok_or(TableError::NoRowStarted)?;
        self.rows[index].push(value.into());
        Ok(self)
    }

    /// Appends a complete row without opening it for further pushes. Used by
    /// adapters that produce whole rows at a time.
    pub(crate) fn append_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    /// Resolves a (column, row) position into a [`Cell`] carrying the header
    /// name and value found there.
    pub fn cell(&self, col: usize, row: usize) -> Result<Cell, TableError> {
        let row_values = self.rows.get(row).ok_or(TableError::IndexOutOfRange {
            what: "row",
            index: row,
            len: self.rows.len(),
        })?;
        let value = row_values.get(col).ok_or(TableError::IndexOutOfRange {
            what: "column",
            index: col,
            len: row_values.len(),
        })?;
        Ok(Cell {
            row,
            col,
            header: self.headers.get(col).cloned(),
            value: value.clone(),
        })
    }

    /// Writes a cell back: header rename and value overwrite in place.
    ///
    /// Tolerant of partial tables: the header write is skipped when the
    /// table has no headers (or the cell carries none), the value write is
    /// skipped when it has no rows. Neither collection is resized.
    pub fn apply(&mut self, cell: &Cell) -> Result<(), TableError> {
        if !self.headers.is_empty() {
            if let Some(header) = &cell.header {
                let len = self.headers.len();
                let slot = self
                    .headers
                    .get_mut(cell.col)
                    .ok_or(TableError::IndexOutOfRange {
                        what: "column",
                        index: cell.col,
                        len,
                    })?;
                *slot = header.clone();
            }
        }
        if !self.rows.is_empty() {
            let len = self.rows.len();
            let row = self.rows.get_mut(cell.row).ok_or(TableError::IndexOutOfRange {
                what: "row",
                index: cell.row,
                len,
            })?;
            let row_len = row.len();
            let slot = row.get_mut(cell.col).ok_or(TableError::IndexOutOfRange {
                what: "column",
                index: cell.col,
                len: row_len,
            })?;
            *slot = cell.value.clone();
        }
        Ok(())
    }

    /// Positional column extraction, top to bottom.
    pub fn values(&self, col: usize) -> Result<Vec<CellValue>, TableError> {
        let mut out = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let value = row.get(col).ok_or(TableError::IndexOutOfRange {
                what: "column",
                index: col,
                len: row.len(),
            })?;
            out.push(value.clone());
        }
        Ok(out)
    }

    /// Named column extraction. Header-qualified, so arity is checked first.
    pub fn values_by_name(&self, name: &str) -> Result<Vec<CellValue>, TableError> {
        self.ensure_arity()?;
        let col = self.column_index(name)?;
        self.values(col)
    }

    pub(crate) fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Checks the arity invariant: with a non-empty header row, every row
    /// must have exactly one value per header.
    pub fn ensure_arity(&self) -> Result<(), TableError> {
        if self.headers.is_empty() {
            return Ok(());
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.headers.len() {
                return Err(TableError::InconsistentArity {
                    row: i,
                    expected: self.headers.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(())
    }

    pub fn to_text(&self) -> Result<String, TableError> {
        self.ensure_arity()?;
        Ok(render::text_grid(self))
    }

    pub fn to_delimited(&self) -> Result<String, TableError> {
        self.ensure_arity()?;
        Ok(render::delimited(self))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<TableData>(json).map(TableData::into_table)
    }

    pub fn snapshot(&self) -> TableData {
        TableData {
            title: self.title.clone(),
            headers: self.headers.clone(),
            rows: self.rows.clone(),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        if self.headers.is_empty() {
            self.rows.iter().map(Vec::len).max().unwrap_or(0)
        } else {
            self.headers.len()
        }
    }

    /// Replaces the identity. Only replay and the tracked seam re-tag:
    /// a reconstructed table must answer for the identity it was built from.
    pub(crate) fn retag(&mut self, id: TableId) {
        self.id = id;
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
