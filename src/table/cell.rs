use serde::{Deserialize, Serialize};

use crate::table::CellValue;

/// A (row, column) reference resolved against one table snapshot.
///
/// Carries the header name and value found at that position. Edit the copy
/// with `with_header` / `with_value`, then write it back through
/// [`Table::apply`](crate::table::Table::apply).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    /// Header at `col`, `None` when the table has no header row.
    pub header: Option<String>,
    pub value: CellValue,
}

impl Cell {
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<CellValue>) -> Self {
        self.value = value.into();
        self
    }
}
