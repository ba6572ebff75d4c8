//! CSV Report Library
//!
//! Turns an uploaded CSV file into a human-readable analytical report.
//!
//! # Overview
//!
//! The pipeline runs these stages in order:
//!
//! - **Loading**: strict CSV parsing with per-column Numeric/Text typing
//! - **Profiling**: row/column/missing counts plus describe-style statistics
//!   for every numeric column
//! - **Column Selection**: a positional heuristic choosing the chart columns
//! - **Charting**: a line-with-markers PNG of y against x
//! - **Composition**: a [`ReportDocument`] with a bounded row preview
//! - **Export** (downloads only): HTML to PDF through an external renderer
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use csv_report::{ReportConfig, ReportPipeline, ReportService};
//!
//! let pipeline = ReportPipeline::builder()
//!     .config(ReportConfig::rooted_at("/var/lib/reports"))
//!     .build()?;
//! let service = ReportService::new(pipeline);
//!
//! let id = service.accept_upload(Some("sales.csv"), &bytes)?;
//! let page = service.preview(id.as_str())?;      // on-screen HTML
//! let pdf = service.download(id.as_str())?;      // exported document
//! ```
//!
//! # Renderers
//!
//! Chart drawing and document conversion sit behind the
//! [`chart::ChartRenderer`] and [`export::DocumentRenderer`] traits. The
//! defaults are [`BitmapChartRenderer`] (Plotters, PNG) and
//! [`WkhtmltopdfRenderer`] (the `wkhtmltopdf` binary). Supply your own through
//! [`ReportPipelineBuilder`] to swap backends or to test without them.

pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod selector;
pub mod service;
pub mod types;

// Re-exports for convenient access
pub use chart::{BitmapChartRenderer, ChartRenderer, ChartSpec, RowOrder};
pub use config::{ConfigValidationError, ReportConfig, ReportConfigBuilder};
pub use error::{ReportError, Result as ReportResult, ResultExt};
pub use export::{
    DocumentExporter, DocumentRenderer, ExportOptions, ExportedDocument, WkhtmltopdfRenderer,
};
pub use loader::DatasetLoader;
pub use pipeline::{
    ClosureProgressReporter, ProgressReporter, ProgressUpdate, ReportPipeline,
    ReportPipelineBuilder, ReportStage,
};
pub use profiler::{DataProfiler, DatasetProfile};
pub use reporting::{HtmlRenderer, HtmlTarget, ReportComposer};
pub use selector::ColumnSelector;
pub use service::{RenderedReport, ReportId, ReportService};
pub use types::{
    ChartArtifact, Column, ColumnKind, ColumnPair, ColumnProfile, ColumnValues, Dataset,
    PreviewTable, ReportDocument, StatisticsTable, SummaryStats,
};
