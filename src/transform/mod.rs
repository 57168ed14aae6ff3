//! Pure structural transformations. Each function reads its source table(s)
//! and builds a brand-new table with a fresh identity; sources are never
//! touched, even when the transformation fails partway.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::table::{Table, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("ascending"),
            Self::Descending => f.write_str("descending"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Projects the named columns, in the given order, over every source row.
///
/// Requested names may repeat; each resolves to the first matching header.
pub fn select<S: AsRef<str>>(source: &Table, columns: &[S]) -> Result<Table, TableError> {
    source.ensure_arity()?;
    let mut indices = Vec::with_capacity(columns.len());
    for name in columns {
        indices.push(source.column_index(name.as_ref())?);
    }
    let mut out = Table::new();
    for name in columns {
        out.with_header(name.as_ref());
    }
    for row in source.rows() {
        out.begin_row();
        for &i in &indices {
            out.push_value(row[i].clone())?;
        }
    }
    Ok(out)
}

/// Reorders rows by the named column.
///
/// Ascending is a stable sort, so equal keys keep their source order.
/// Descending is the exact reverse of the ascending permutation, which keeps
/// tie behavior symmetric instead of re-deciding it with a negated
/// comparator.
pub fn sort(source: &Table, column: &str, order: SortOrder) -> Result<Table, TableError> {
    source.ensure_arity()?;
    let col = source.column_index(column)?;
    let keys = source.values(col)?;

    if let Some(first) = keys.first() {
        for key in &keys[1..] {
            first.compare(key)?;
        }
    }

    let mut permutation: Vec<usize> = (0..keys.len()).collect();
    // Cross-variant pairs were rejected above, so the comparator is total.
    permutation.sort_by(|&a, &b| keys[a].compare(&keys[b]).unwrap_or(Ordering::Equal));
    if order == SortOrder::Descending {
        permutation.reverse();
    }

    let mut out = Table::new();
    for header in source.headers() {
        out.with_header(header.clone());
    }
    for &i in &permutation {
        out.begin_row();
        for value in &source.rows()[i] {
            out.push_value(value.clone())?;
        }
    }
    Ok(out)
}

/// Keeps rows whose cell in the named column, rendered as text, matches the
/// pattern in full. The pattern is anchored at both ends; substring hits do
/// not count.
pub fn filter(source: &Table, column: &str, pattern: &str) -> Result<Table, TableError> {
    source.ensure_arity()?;
    let col = source.column_index(column)?;
    let regex =
        Regex::new(&format!("^(?:{pattern})$")).map_err(|e| TableError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;

    let mut out = Table::new();
    for header in source.headers() {
        out.with_header(header.clone());
    }
    for row in source.rows() {
        if regex.is_match(&row[col].to_text()) {
            out.begin_row();
            for value in row {
                out.push_value(value.clone())?;
            }
        }
    }
    Ok(out)
}

/// Nested-loop equi-join on one positional column from each side.
///
/// Every (left, right) row pair whose key cells compare equal emits one
/// output row, left values then right values; headers concatenate the same
/// way. A left row matching k right rows emits k output rows; no matches, no
/// row. No dedup and no outer semantics.
pub fn join(
    left: &Table,
    right: &Table,
    left_col: usize,
    right_col: usize,
) -> Result<Table, TableError> {
    let mut out = Table::new();
    for header in left.headers() {
        out.with_header(header.clone());
    }
    for header in right.headers() {
        out.with_header(header.clone());
    }
    for left_row in left.rows() {
        let left_key = left_row
            .get(left_col)
            .ok_or(TableError::IndexOutOfRange {
                what: "column",
                index: left_col,
                len: left_row.len(),
            })?;
        for right_row in right.rows() {
            let right_key = right_row
                .get(right_col)
                .ok_or(TableError::IndexOutOfRange {
                    what: "column",
                    index: right_col,
                    len: right_row.len(),
                })?;
            if left_key.compare(right_key)? == Ordering::Equal {
                out.begin_row();
                for value in left_row {
                    out.push_value(value.clone())?;
                }
                for value in right_row {
                    out.push_value(value.clone())?;
                }
            }
        }
    }
    Ok(out)
}
