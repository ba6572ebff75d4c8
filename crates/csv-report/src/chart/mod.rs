//! Chart construction.
//!
//! [`ChartSpec::build`] turns a dataset and a [`ColumnPair`] into everything
//! needed to draw the chart: ordered points, axis labels, title and pixel
//! size. Drawing itself sits behind the [`ChartRenderer`] trait so the
//! pipeline does not depend on a particular backend. [`BitmapChartRenderer`]
//! is the default PNG implementation.

mod bitmap;

pub use bitmap::BitmapChartRenderer;

use crate::error::{ReportError, Result};
use crate::types::{Column, ColumnPair, ColumnValues, Dataset};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::warn;

/// Trait for backends that draw a [`ChartSpec`] to an image file.
///
/// Implementations must overwrite any existing file at `path` and must not
/// leave a half-written image behind when they fail.
pub trait ChartRenderer: Send + Sync {
    /// Draw the chart and write it to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Render`] if the surface cannot be created,
    /// drawn or written.
    fn render(&self, spec: &ChartSpec, path: &Path) -> Result<()>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Row order used for plotting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOrder {
    /// Row indices sorted ascending by the x column.
    Sorted(Vec<usize>),
    /// The x values could not be ordered; keep the dataset order.
    Original,
}

impl RowOrder {
    /// Sort row indices by a column's values, ascending, missing cells last.
    ///
    /// Numeric columns sort numerically and text columns lexicographically.
    /// A numeric column holding NaN cannot be ordered and yields
    /// [`RowOrder::Original`].
    pub fn sorted_by(column: &Column) -> Self {
        let mut order: Vec<usize> = (0..column.len()).collect();

        match column.values() {
            ColumnValues::Numeric(values) => {
                if values.iter().flatten().any(|v| v.is_nan()) {
                    return Self::Original;
                }
                order.sort_by(|&a, &b| {
                    let x = values.get(a).copied().flatten();
                    let y = values.get(b).copied().flatten();
                    missing_last(x, y, |x, y| x.partial_cmp(&y).unwrap_or(Ordering::Equal))
                });
            }
            ColumnValues::Text(values) => {
                order.sort_by(|&a, &b| {
                    let x = values.get(a).and_then(Option::as_deref);
                    let y = values.get(b).and_then(Option::as_deref);
                    missing_last(x, y, |x, y| x.cmp(y))
                });
            }
        }

        Self::Sorted(order)
    }

    /// Materialize the order for a dataset of `len` rows.
    pub fn indices(&self, len: usize) -> Vec<usize> {
        match self {
            Self::Sorted(order) => order.clone(),
            Self::Original => (0..len).collect(),
        }
    }
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Everything needed to draw one line-with-markers chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Points in plotting order. For a text x column the x coordinate is the
    /// index into `x_categories`.
    pub points: Vec<(f64, f64)>,
    /// Category names, in order of first appearance, when x is a text column.
    pub x_categories: Option<Vec<String>>,
    pub width: u32,
    pub height: u32,
}

impl ChartSpec {
    /// Build the chart for `pair`, plotting y against x.
    ///
    /// Rows are sorted by x when possible. Rows with a missing x or y are
    /// skipped.
    pub fn build(dataset: &Dataset, pair: &ColumnPair, width: u32, height: u32) -> Result<Self> {
        let x = lookup(dataset, &pair.x)?;
        let y = lookup(dataset, &pair.y)?;

        let ColumnValues::Numeric(y_values) = y.values() else {
            return Err(ReportError::Render(format!(
                "y column '{}' is not numeric",
                pair.y
            )));
        };

        let order = RowOrder::sorted_by(x);
        if order == RowOrder::Original {
            warn!(
                "Could not sort rows by '{}'; plotting in original order",
                pair.x
            );
        }
        let rows = order.indices(dataset.row_count());

        let (points, x_categories) = match x.values() {
            ColumnValues::Numeric(x_values) => {
                let points = rows
                    .iter()
                    .filter_map(|&i| {
                        let xv = x_values.get(i).copied().flatten()?;
                        let yv = y_values.get(i).copied().flatten()?;
                        Some((xv, yv))
                    })
                    .collect();
                (points, None)
            }
            ColumnValues::Text(x_values) => {
                let mut categories: Vec<String> = Vec::new();
                let mut points = Vec::new();
                for &i in &rows {
                    let Some(label) = x_values.get(i).and_then(Option::as_deref) else {
                        continue;
                    };
                    let position = match categories.iter().position(|c| c == label) {
                        Some(p) => p,
                        None => {
                            categories.push(label.to_string());
                            categories.len() - 1
                        }
                    };
                    if let Some(yv) = y_values.get(i).copied().flatten() {
                        points.push((position as f64, yv));
                    }
                }
                (points, Some(categories))
            }
        };

        Ok(Self {
            title: pair.title(),
            x_label: pair.x.clone(),
            y_label: pair.y.clone(),
            points,
            x_categories,
            width,
            height,
        })
    }

    /// Axis ranges covering every point, padded so markers are not clipped.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let x_range = match &self.x_categories {
            Some(categories) => (-0.5, categories.len().max(1) as f64 - 0.5),
            None => padded_range(self.points.iter().map(|p| p.0)),
        };
        let y_range = padded_range(self.points.iter().map(|p| p.1));
        (x_range, y_range)
    }

    /// Axis label for an x coordinate: the category name for text columns.
    pub fn x_tick_label(&self, x: f64) -> String {
        match &self.x_categories {
            Some(categories) => {
                let rounded = x.round();
                if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
                    return String::new();
                }
                categories
                    .get(rounded as usize)
                    .cloned()
                    .unwrap_or_default()
            }
            None => crate::types::format_number(x),
        }
    }
}

fn lookup<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| ReportError::Render(format!("column '{name}' not found in dataset")))
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((0.0, 1.0));

    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}
