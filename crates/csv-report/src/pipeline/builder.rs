//! Main report pipeline module.
//!
//! This module provides the core `ReportPipeline` struct and builder for
//! orchestrating Loader -> Profiler -> Selector -> Chart -> Composer, and the
//! optional export step.

use crate::chart::{BitmapChartRenderer, ChartRenderer, ChartSpec};
use crate::config::{ConfigValidationError, ReportConfig};
use crate::error::Result;
use crate::export::{DocumentExporter, DocumentRenderer, ExportedDocument, WkhtmltopdfRenderer};
use crate::loader::DatasetLoader;
use crate::pipeline::progress::{
    ClosureProgressReporter, ProgressReporter, ProgressUpdate, ReportStage,
};
use crate::profiler::DataProfiler;
use crate::reporting::{HtmlRenderer, HtmlTarget, ReportComposer};
use crate::selector::ColumnSelector;
use crate::types::{ChartArtifact, ColumnPair, Dataset, ReportDocument};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The report pipeline.
///
/// Use [`ReportPipeline::builder()`] to create a new pipeline with custom
/// configuration and renderers.
///
/// # Example
///
/// ```rust,ignore
/// use csv_report::{ReportConfig, ReportPipeline};
///
/// let pipeline = ReportPipeline::builder()
///     .config(ReportConfig::rooted_at("/var/lib/reports"))
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?;
///
/// let document = pipeline.generate_from_path(&id, Path::new("data.csv"))?;
/// let exported = pipeline.export(&document)?;
/// ```
pub struct ReportPipeline {
    config: ReportConfig,
    chart_renderer: Arc<dyn ChartRenderer>,
    exporter: DocumentExporter,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    composer: ReportComposer,
}

// Shared between request handlers on different threads.
static_assertions::assert_impl_all!(ReportPipeline: Send, Sync);

impl std::fmt::Debug for ReportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportPipeline")
            .field("config", &self.config)
            .field("chart_renderer", &self.chart_renderer.name())
            .field("exporter", &self.exporter)
            .finish_non_exhaustive()
    }
}

impl ReportPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> ReportPipelineBuilder {
        ReportPipelineBuilder::default()
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Load a CSV file and build its report.
    pub fn generate_from_path(&self, report_id: &str, csv_path: &Path) -> Result<ReportDocument> {
        self.finish(self.run_from_path(report_id, csv_path), "Report ready")
    }

    /// Build the report for an already loaded dataset.
    ///
    /// Renders the chart to [`ReportConfig::chart_path`] when a column pair
    /// was selected, overwriting any previous chart for `report_id`.
    pub fn generate(&self, report_id: &str, dataset: &Dataset) -> Result<ReportDocument> {
        self.finish(self.run(report_id, dataset), "Report ready")
    }

    /// Render a composed document to HTML.
    pub fn render_html(&self, document: &ReportDocument, target: HtmlTarget) -> String {
        HtmlRenderer::new(target).render(document)
    }

    /// Export a composed document to [`ReportConfig::document_path`].
    pub fn export(&self, document: &ReportDocument) -> Result<ExportedDocument> {
        self.finish(self.run_export(document), "Document exported")
    }

    fn finish<T>(&self, result: Result<T>, done: &str) -> Result<T> {
        match result {
            Ok(value) => {
                self.report_progress(ProgressUpdate::complete(done));
                Ok(value)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_from_path(&self, report_id: &str, csv_path: &Path) -> Result<ReportDocument> {
        self.report_progress(ProgressUpdate::new(
            ReportStage::Loading,
            0.0,
            format!("Loading {}...", csv_path.display()),
        ));
        let dataset = DatasetLoader::from_path(csv_path)?;
        self.report_progress(ProgressUpdate::new(
            ReportStage::Loading,
            1.0,
            format!(
                "Loaded {} rows x {} columns",
                dataset.row_count(),
                dataset.column_count()
            ),
        ));

        self.run(report_id, &dataset)
    }

    fn run_export(&self, document: &ReportDocument) -> Result<ExportedDocument> {
        self.report_progress(ProgressUpdate::new(
            ReportStage::Exporting,
            0.0,
            "Exporting document...",
        ));
        let html = self.render_html(document, HtmlTarget::Print);
        let target = self.config.document_path(&document.report_id);
        let exported = self.exporter.export(&html, &target)?;
        self.report_progress(ProgressUpdate::new(
            ReportStage::Exporting,
            1.0,
            "Export complete",
        ));
        Ok(exported)
    }

    fn run(&self, report_id: &str, dataset: &Dataset) -> Result<ReportDocument> {
        let start_time = Instant::now();
        info!("Generating report {}...", report_id);

        // Step 1: Profile
        self.report_progress(ProgressUpdate::new(
            ReportStage::Profiling,
            0.0,
            "Profiling dataset...",
        ));
        let profile = DataProfiler::profile_dataset(dataset);
        self.report_progress(ProgressUpdate::new(
            ReportStage::Profiling,
            1.0,
            format!(
                "Profiled {} numeric columns",
                profile.column_profiles.len()
            ),
        ));

        // Step 2: Select chart columns
        self.report_progress(ProgressUpdate::new(
            ReportStage::Selecting,
            0.0,
            "Selecting chart columns...",
        ));
        let selection = ColumnSelector::select(dataset);

        // Step 3: Chart
        let chart = match &selection {
            Some(pair) => Some(self.render_chart(report_id, dataset, pair)?),
            None => {
                info!("No chart for report {}", report_id);
                None
            }
        };

        // Step 4: Compose
        self.report_progress(ProgressUpdate::new(
            ReportStage::Composing,
            0.0,
            "Composing report...",
        ));
        let document = self
            .composer
            .compose(report_id, profile, dataset, selection, chart);

        info!(
            "Report {} generated in {:?}",
            report_id,
            start_time.elapsed()
        );
        Ok(document)
    }

    fn render_chart(
        &self,
        report_id: &str,
        dataset: &Dataset,
        pair: &ColumnPair,
    ) -> Result<ChartArtifact> {
        self.report_progress(ProgressUpdate::with_sub_stage(
            ReportStage::Charting,
            pair.title(),
            0.0,
            "Rendering chart...",
        ));

        let spec = ChartSpec::build(
            dataset,
            pair,
            self.config.chart_width,
            self.config.chart_height,
        )?;
        let path = self.config.chart_path(report_id);
        debug!(
            "Drawing '{}' with {} to {}",
            spec.title,
            self.chart_renderer.name(),
            path.display()
        );
        self.chart_renderer.render(&spec, &path)?;

        self.report_progress(ProgressUpdate::new(
            ReportStage::Charting,
            1.0,
            "Chart rendered",
        ));

        Ok(ChartArtifact {
            url: self.config.chart_url(report_id),
            path,
            x_label: spec.x_label,
            y_label: spec.y_label,
            title: spec.title,
        })
    }
}

/// Builder for [`ReportPipeline`].
#[derive(Default)]
pub struct ReportPipelineBuilder {
    config: Option<ReportConfig>,
    chart_renderer: Option<Arc<dyn ChartRenderer>>,
    document_renderer: Option<Arc<dyn DocumentRenderer>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(ReportPipelineBuilder: Send);

impl ReportPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the chart backend. Defaults to [`BitmapChartRenderer`].
    pub fn chart_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.chart_renderer = Some(renderer);
        self
    }

    /// Replace the document backend. Defaults to [`WkhtmltopdfRenderer`]
    /// using [`ReportConfig::wkhtmltopdf_path`].
    pub fn document_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.document_renderer = Some(renderer);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<ReportPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let document_renderer = self.document_renderer.unwrap_or_else(|| {
            Arc::new(WkhtmltopdfRenderer::from_optional(
                config.wkhtmltopdf_path.as_deref(),
            ))
        });
        let composer = ReportComposer::new(config.report_title.clone(), config.preview_rows);

        Ok(ReportPipeline {
            chart_renderer: self
                .chart_renderer
                .unwrap_or_else(|| Arc::new(BitmapChartRenderer::new())),
            exporter: DocumentExporter::new(document_renderer),
            progress_reporter: self.progress_reporter,
            composer,
            config,
        })
    }
}
