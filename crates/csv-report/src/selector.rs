//! Chart column selection.
//!
//! The rule is positional only, evaluated in priority order:
//!
//! 1. Two or more numeric columns: the first two, as (x, y).
//! 2. Exactly one numeric column: it becomes y, and x is the first text column.
//! 3. Otherwise there is no chart.
//!
//! No variance or correlation is considered. The choice depends only on the
//! ordered `(name, kind)` sequence, so it is the same for every dataset with
//! the same schema.

use crate::types::{ColumnKind, ColumnPair, Dataset};
use tracing::debug;

pub struct ColumnSelector;

impl ColumnSelector {
    /// Pick the chart columns for a dataset.
    pub fn select(dataset: &Dataset) -> Option<ColumnPair> {
        let selection = Self::select_from_schema(&dataset.schema());
        match &selection {
            Some(pair) => debug!("Selected chart columns x='{}', y='{}'", pair.x, pair.y),
            None => debug!("No suitable column pair for a chart"),
        }
        selection
    }

    /// Pick the chart columns from an ordered `(name, kind)` list.
    pub fn select_from_schema(schema: &[(&str, ColumnKind)]) -> Option<ColumnPair> {
        let mut numeric = schema
            .iter()
            .filter(|(_, kind)| *kind == ColumnKind::Numeric)
            .map(|(name, _)| *name);

        match (numeric.next(), numeric.next()) {
            (Some(x), Some(y)) => Some(ColumnPair::new(x, y)),
            (Some(y), None) => schema
                .iter()
                .find(|(_, kind)| *kind == ColumnKind::Text)
                .map(|(x, _)| ColumnPair::new(*x, y)),
            _ => None,
        }
    }
}
