use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Dataset
// ============================================================================

/// Semantic type of a column, assigned once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every present value parses as a number.
    Numeric,
    /// Anything else.
    Text,
}

/// Typed cell values of one column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named column of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Numeric(_) => ColumnKind::Numeric,
            ColumnValues::Text(_) => ColumnKind::Text,
        }
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of cells with no value under this column's type.
    pub fn missing_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnValues::Text(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Present numeric values in row order; empty for text columns.
    pub fn present_numbers(&self) -> Vec<f64> {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().flatten().copied().collect(),
            ColumnValues::Text(_) => Vec::new(),
        }
    }

    /// Cell formatted for a table. Missing cells print as `NaN`.
    pub fn display_cell(&self, row: usize) -> String {
        match &self.values {
            ColumnValues::Numeric(v) => match v.get(row).copied().flatten() {
                Some(n) => format_number(n),
                None => MISSING_MARKER.to_string(),
            },
            ColumnValues::Text(v) => match v.get(row) {
                Some(Some(s)) => s.clone(),
                _ => MISSING_MARKER.to_string(),
            },
        }
    }
}

/// Printed in place of missing cells and undefined statistics.
pub const MISSING_MARKER: &str = "NaN";

/// Whole numbers print without a fractional part; everything else as-is.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// In-memory typed dataset. Every column has exactly `row_count` cells.
///
/// Built once by the loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

/// Deserialized form of [`Dataset`], validated through [`Dataset::new`].
#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<Column>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = ReportError;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Self::new(raw.columns)
    }
}

impl Dataset {
    /// Assemble a dataset, rejecting columns of unequal length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(ReportError::Parse(format!(
                "column '{}' has {} values, expected {}",
                bad.name(),
                bad.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in their original declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Numeric columns in declaration order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// `(name, kind)` pairs in declaration order.
    pub fn schema(&self) -> Vec<(&str, ColumnKind)> {
        self.columns.iter().map(|c| (c.name(), c.kind())).collect()
    }
}

// ============================================================================
// Profiling output
// ============================================================================

/// Descriptive statistics of one numeric column.
///
/// Every value is rounded to 3 decimal places. Statistics that are undefined
/// for the column (for example the standard deviation of a single value) are
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnProfile {
    /// Metric labels in table order, paired with their values.
    pub fn metrics(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.p25),
            ("50%", self.p50),
            ("75%", self.p75),
            ("max", self.max),
        ]
    }
}

/// Dataset-wide summary shown at the top of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub rows: usize,
    pub cols: usize,
    /// Sum over all columns of their missing-cell counts.
    pub missing_total: usize,
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub generated_at: String,
}

// ============================================================================
// Selection and chart
// ============================================================================

/// The two columns chosen for the chart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPair {
    pub x: String,
    pub y: String,
}

impl ColumnPair {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    /// Chart title, `"{y} by {x}"`.
    pub fn title(&self) -> String {
        format!("{} by {}", self.y, self.x)
    }
}

/// A chart image written to disk for one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartArtifact {
    pub path: PathBuf,
    /// Link used by the on-screen view.
    pub url: String,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
}

// ============================================================================
// Report document
// ============================================================================

/// Describe-style statistics table: one column per profiled numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsTable {
    pub profiles: Vec<ColumnProfile>,
}

/// The first rows of the dataset, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row count of the full dataset.
    pub total_rows: usize,
}

/// Everything a viewer or exporter needs to present one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub report_id: String,
    pub title: String,
    pub summary: SummaryStats,
    /// Present iff the dataset has at least one numeric column.
    pub statistics: Option<StatisticsTable>,
    pub preview: PreviewTable,
    pub selection: Option<ColumnPair>,
    /// Present iff a selection exists and the chart was rendered.
    pub chart: Option<ChartArtifact>,
}
