//! Delimited-text files (CSV and friends) as a [`RowSource`].

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::ingest::{AdapterError, RowSource};
use crate::table::CellValue;

/// How a delimited file is shaped.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedOptions {
    /// Field separator. Must fit in one byte; `','` for CSV, `'\t'` for TSV.
    pub delimiter: char,
    /// When set, the first record carries the column names.
    pub has_headers: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_headers: true,
        }
    }
}

/// Streaming reader over a delimited file. Fields may be quoted with `"`;
/// inside quotes the delimiter and line breaks are literal and `""` is an
/// escaped quote, matching what the delimited renderer writes. Every value
/// comes out as [`CellValue::Text`], since delimited text carries no type
/// information.
#[derive(Debug)]
pub struct DelimitedSource {
    reader: csv::Reader<File>,
    columns: Vec<String>,
}

impl DelimitedSource {
    /// Opens `path` for streaming. With `has_headers` set, the header record
    /// is consumed here and row iteration starts at the first data record.
    pub fn open(path: &Path, options: DelimitedOptions) -> Result<Self, AdapterError> {
        let delimiter = u8::try_from(options.delimiter)
            .map_err(|_| AdapterError::Delimiter(options.delimiter))?;
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(options.has_headers)
            .flexible(true)
            .from_reader(file);
        let columns = if options.has_headers {
            reader.headers()?.iter().map(String::from).collect()
        } else {
            Vec::new()
        };
        Ok(Self { reader, columns })
    }
}

impl RowSource for DelimitedSource {
    fn columns(&mut self) -> Result<Vec<String>, AdapterError> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<Option<Vec<CellValue>>, AdapterError> {
        let mut record = StringRecord::new();
        if !self.reader.read_record(&mut record)? {
            return Ok(None);
        }
        Ok(Some(
            record
                .iter()
                .map(|field| CellValue::Text(field.to_string()))
                .collect(),
        ))
    }
}
