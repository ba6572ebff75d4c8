use crate::profiler::DatasetProfile;
use crate::types::{
    ChartArtifact, ColumnPair, Dataset, PreviewTable, ReportDocument, StatisticsTable,
};
use tracing::debug;

/// Assembles profiler output, a bounded preview and the optional chart into a
/// [`ReportDocument`].
#[derive(Debug, Clone)]
pub struct ReportComposer {
    title: String,
    preview_rows: usize,
}

impl ReportComposer {
    pub fn new(title: impl Into<String>, preview_rows: usize) -> Self {
        Self {
            title: title.into(),
            preview_rows,
        }
    }

    /// Build the document for one report.
    ///
    /// A chart without a selection is dropped: the chart section only exists
    /// for a non-empty selection that was rendered.
    pub fn compose(
        &self,
        report_id: &str,
        profile: DatasetProfile,
        dataset: &Dataset,
        selection: Option<ColumnPair>,
        chart: Option<ChartArtifact>,
    ) -> ReportDocument {
        let statistics = if profile.column_profiles.is_empty() {
            None
        } else {
            Some(StatisticsTable {
                profiles: profile.column_profiles,
            })
        };
        let chart = if selection.is_some() { chart } else { None };
        let preview = self.preview(dataset);

        debug!(
            "Composed report {}: {} preview rows, statistics={}, chart={}",
            report_id,
            preview.rows.len(),
            statistics.is_some(),
            chart.is_some()
        );

        ReportDocument {
            report_id: report_id.to_string(),
            title: self.title.clone(),
            summary: profile.summary,
            statistics,
            preview,
            selection,
            chart,
        }
    }

    /// The first `min(preview_rows, rows)` rows with every column.
    pub fn preview(&self, dataset: &Dataset) -> PreviewTable {
        let shown = self.preview_rows.min(dataset.row_count());
        let columns = dataset.columns();

        let rows = (0..shown)
            .map(|row| columns.iter().map(|c| c.display_cell(row)).collect())
            .collect();

        PreviewTable {
            headers: dataset.column_names().into_iter().map(String::from).collect(),
            rows,
            total_rows: dataset.row_count(),
        }
    }
}
