//! Dataset profiling.
//!
//! Produces the report summary (row/column counts, missing cells, timestamp)
//! and describe-style statistics for every numeric column.

mod statistics;

use crate::types::{Column, ColumnProfile, ColumnValues, Dataset, SummaryStats};
use chrono::Local;
use polars::prelude::*;
use statistics::{percentile, round3, sample_std};
use tracing::debug;

/// Timestamp layout used in the report summary.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of profiling one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetProfile {
    pub summary: SummaryStats,
    /// One entry per numeric column, in column order. Empty when the dataset
    /// has no numeric column.
    pub column_profiles: Vec<ColumnProfile>,
}

/// Computes summary and per-column statistics. Pure computation, no I/O.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    pub fn profile_dataset(dataset: &Dataset) -> DatasetProfile {
        let summary = Self::summarize(dataset);

        let column_profiles: Vec<ColumnProfile> = dataset
            .numeric_columns()
            .map(Self::profile_column)
            .collect();

        for profile in &column_profiles {
            debug!(
                "  {}: count={} mean={:?} std={:?}",
                profile.column, profile.count, profile.mean, profile.std
            );
        }

        DatasetProfile {
            summary,
            column_profiles,
        }
    }

    /// Row/column counts, missing-cell total and generation time.
    pub fn summarize(dataset: &Dataset) -> SummaryStats {
        SummaryStats {
            rows: dataset.row_count(),
            cols: dataset.column_count(),
            missing_total: dataset.columns().iter().map(Column::missing_count).sum(),
            generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Describe one numeric column. Text columns yield a zero-count profile.
    pub fn profile_column(column: &Column) -> ColumnProfile {
        let values = match column.values() {
            ColumnValues::Numeric(cells) => {
                Float64Chunked::new(column.name().into(), cells.as_slice())
            }
            ColumnValues::Text(_) => Float64Chunked::full_null(column.name().into(), 0),
        };

        ColumnProfile {
            column: column.name().to_string(),
            count: values.len() - values.null_count(),
            mean: values.mean().map(round3),
            std: sample_std(&values).map(round3),
            min: values.min().map(round3),
            p25: percentile(&values, 0.25).map(round3),
            p50: percentile(&values, 0.50).map(round3),
            p75: percentile(&values, 0.75).map(round3),
            max: values.max().map(round3),
        }
    }
}
