//! CSV ingestion.
//!
//! Parsing happens in two passes over already-buffered input:
//!
//! 1. The `csv` reader splits records and enforces that every row has as many
//!    fields as the header. Invalid UTF-8 and ragged rows are [`ReportError::Parse`].
//! 2. Each column is handed to Polars as a trimmed string series and cast to
//!    `Float64`. A column is numeric when the cast loses no present value;
//!    otherwise it stays text.
//!
//! Empty fields and the usual missing-value markers (`NA`, `null`, ...) become
//! missing cells in either column type. Numeric cells that parse to NaN
//! (`NAN`, ...) are missing too.

use crate::error::{ReportError, Result};
use crate::types::{Column, Dataset};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Field values treated as missing regardless of column type.
pub const MISSING_MARKERS: [&str; 14] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "#NA",
    "<NA>",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Loads CSV input into a typed [`Dataset`].
pub struct DatasetLoader;

impl DatasetLoader {
    /// Read and parse a CSV file.
    pub fn from_path(path: &Path) -> Result<Dataset> {
        let bytes = std::fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(&bytes)
    }

    /// Parse CSV bytes. The first record is the header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Dataset> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ReportError::Parse(format!(
                "input is not valid UTF-8 (first bad byte at offset {})",
                e.valid_up_to()
            ))
        })?;

        let (headers, raw_columns) = read_records(text)?;
        let mut columns = Vec::with_capacity(headers.len());
        for (name, raw) in headers.into_iter().zip(raw_columns) {
            columns.push(type_column(name, raw)?);
        }

        let dataset = Dataset::new(columns)?;
        info!(
            "Loaded dataset: {} rows x {} columns ({} numeric)",
            dataset.row_count(),
            dataset.column_count(),
            dataset.numeric_columns().count()
        );
        Ok(dataset)
    }
}

/// Split CSV text into unique header names and per-column raw cells.
fn read_records(text: &str) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let header_record = reader.headers().map_err(parse_error)?.clone();
    if header_record.is_empty() {
        return Err(ReportError::Parse("input has no header row".to_string()));
    }
    let headers = dedupe_headers(header_record.iter());

    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        for (cells, field) in raw_columns.iter_mut().zip(record.iter()) {
            cells.push(if MISSING_MARKERS.contains(&field) {
                None
            } else {
                Some(field.to_string())
            });
        }
    }

    Ok((headers, raw_columns))
}

fn parse_error(e: csv::Error) -> ReportError {
    match e.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => {
            let line = pos
                .as_ref()
                .map(|p| p.line().to_string())
                .unwrap_or_else(|| "?".to_string());
            ReportError::Parse(format!(
                "line {line} has {len} fields but the header has {expected_len}"
            ))
        }
        csv::ErrorKind::Utf8 { pos, .. } => {
            let line = pos
                .as_ref()
                .map(|p| p.line().to_string())
                .unwrap_or_else(|| "?".to_string());
            ReportError::Parse(format!("line {line} is not valid UTF-8"))
        }
        _ => ReportError::Csv(e),
    }
}

/// Blank header names become `Unnamed: {i}`; repeats get `.1`, `.2`, ... suffixes.
fn dedupe_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::new();

    for (i, name) in raw.enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        while let Some(n) = seen.get_mut(&candidate) {
            *n += 1;
            candidate = format!("{base}.{n}");
        }
        seen.insert(candidate.clone(), 0);
        headers.push(candidate);
    }

    headers
}

/// Tag a column numeric if every present cell, trimmed of surrounding
/// whitespace, survives a `Float64` cast.
///
/// Numeric cells that parse to NaN count as missing. Text columns keep the
/// raw, untrimmed cells.
fn type_column(name: String, raw: Vec<Option<String>>) -> Result<Column> {
    let trimmed: Vec<Option<&str>> = raw.iter().map(|c| c.as_deref().map(str::trim)).collect();
    let series = Series::new(name.as_str().into(), trimmed.as_slice());
    let present = series.len() - series.null_count();
    let as_float = series.cast(&DataType::Float64)?;
    let parsed = as_float.len() - as_float.null_count();

    if parsed == present {
        let values: Vec<Option<f64>> = as_float
            .f64()?
            .into_iter()
            .map(|v| v.filter(|n| !n.is_nan()))
            .collect();
        debug!("Column '{}': numeric ({} present)", name, present);
        Ok(Column::numeric(name, values))
    } else {
        debug!(
            "Column '{}': text ({} of {} present values are numbers)",
            name, parsed, present
        );
        Ok(Column::text(name, raw))
    }
}
