//! Progress reporting for the report pipeline.
//!
//! Every stage boundary is announced to an optional [`ProgressReporter`], so a
//! front end running the pipeline on a worker thread can show where it is.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv_report::pipeline::ReportPipeline;
//!
//! let pipeline = ReportPipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of report generation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    /// Reading and typing the CSV input
    Loading,
    /// Summary and per-column statistics
    Profiling,
    /// Choosing the chart columns
    Selecting,
    /// Drawing the chart image
    Charting,
    /// Building the report document
    Composing,
    /// Converting markup to the downloadable document
    Exporting,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl ReportStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Dataset",
            Self::Profiling => "Profiling Dataset",
            Self::Selecting => "Selecting Columns",
            Self::Charting => "Rendering Chart",
            Self::Composing => "Composing Report",
            Self::Exporting => "Exporting Document",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// Weights of the working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Profiling => 0.15,
            Self::Selecting => 0.05,
            Self::Charting => 0.30,
            Self::Composing => 0.10,
            Self::Exporting => 0.30,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Profiling => 0.10,
            Self::Selecting => 0.25,
            Self::Charting => 0.30,
            Self::Composing => 0.60,
            Self::Exporting => 0.70,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: ReportStage,

    /// Optional detail, e.g. the chart being drawn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: ReportStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn with_sub_stage(
        stage: ReportStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::new(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: ReportStage::Complete,
            sub_stage: None,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: ReportStage::Failed,
            sub_stage: None,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from the pipeline.
///
/// Implementations must be `Send + Sync` so the pipeline can run on a
/// background thread while updates reach the UI.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
