//! Configuration types for the report pipeline.
//!
//! All filesystem locations and size caps live in [`ReportConfig`], which is
//! handed to the pipeline and the service at construction time. Nothing in the
//! crate reads process-wide directories on its own.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of dataset rows shown in the preview table.
pub const DEFAULT_PREVIEW_ROWS: usize = 30;

/// Default chart size in pixels (6.4 x 4.8 inches at 150 dpi).
pub const DEFAULT_CHART_WIDTH: u32 = 960;
pub const DEFAULT_CHART_HEIGHT: u32 = 720;

/// Default report title.
pub const DEFAULT_REPORT_TITLE: &str = "DATA ANALYSIS REPORT (FROM CSV)";

/// Default upload size cap (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Configuration for the report pipeline.
///
/// Use [`ReportConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use csv_report::config::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .upload_dir("/var/lib/reports/uploads")
///     .preview_rows(50)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory holding one persisted copy of every upload (`{id}.csv`).
    /// Default: "uploads"
    pub upload_dir: PathBuf,

    /// Directory holding one chart image per report (`chart_{id}.png`).
    /// Default: "static"
    pub chart_dir: PathBuf,

    /// Directory holding one exported document per report (`report_{id}.pdf`).
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// URL prefix under which `chart_dir` is served for the on-screen view.
    /// Default: "/static"
    pub static_url_prefix: String,

    /// Maximum number of rows in the preview table.
    /// Default: 30
    pub preview_rows: usize,

    /// Chart width in pixels.
    /// Default: 960
    pub chart_width: u32,

    /// Chart height in pixels.
    /// Default: 720
    pub chart_height: u32,

    /// Title printed at the top of every report.
    pub report_title: String,

    /// Largest accepted upload in bytes.
    /// Default: 16 MiB
    pub max_upload_bytes: u64,

    /// Explicit path to the `wkhtmltopdf` binary.
    /// If None, the binary is looked up on `PATH`.
    pub wkhtmltopdf_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            chart_dir: PathBuf::from("static"),
            output_dir: PathBuf::from("outputs"),
            static_url_prefix: "/static".to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            chart_width: DEFAULT_CHART_WIDTH,
            chart_height: DEFAULT_CHART_HEIGHT,
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            wkhtmltopdf_path: None,
        }
    }
}

impl ReportConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Create a configuration whose three storage directories live under `root`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            upload_dir: root.join("uploads"),
            chart_dir: root.join("static"),
            output_dir: root.join("outputs"),
            ..Self::default()
        }
    }

    /// Validate the configuration and return errors if invalid.
    ///
    /// Chart dimensions are checked by the chart renderer, not here.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidPreviewRows(self.preview_rows));
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigValidationError::InvalidUploadLimit(
                self.max_upload_bytes,
            ));
        }

        if self.report_title.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTitle);
        }

        Ok(())
    }

    /// Path of the persisted upload for a report identifier.
    pub fn upload_path(&self, id: &str) -> PathBuf {
        self.upload_dir.join(format!("{id}.csv"))
    }

    /// Path of the chart image for a report identifier.
    pub fn chart_path(&self, id: &str) -> PathBuf {
        self.chart_dir.join(chart_file_name(id))
    }

    /// URL of the chart image for the on-screen view.
    pub fn chart_url(&self, id: &str) -> String {
        format!(
            "{}/{}",
            self.static_url_prefix.trim_end_matches('/'),
            chart_file_name(id)
        )
    }

    /// Path of the exported document for a report identifier.
    pub fn document_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("report_{id}.pdf"))
    }
}

fn chart_file_name(id: &str) -> String {
    format!("chart_{id}.png")
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid preview row count: {0} (must be at least 1)")]
    InvalidPreviewRows(usize),

    #[error("Invalid upload size limit: {0} bytes (must be at least 1)")]
    InvalidUploadLimit(u64),

    #[error("Report title must not be empty")]
    EmptyTitle,
}

impl From<ConfigValidationError> for crate::error::ReportError {
    fn from(e: ConfigValidationError) -> Self {
        crate::error::ReportError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`ReportConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    upload_dir: Option<PathBuf>,
    chart_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    static_url_prefix: Option<String>,
    preview_rows: Option<usize>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
    report_title: Option<String>,
    max_upload_bytes: Option<u64>,
    wkhtmltopdf_path: Option<PathBuf>,
}

impl ReportConfigBuilder {
    /// Set the directory for persisted uploads.
    pub fn upload_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(path.into());
        self
    }

    /// Set the directory for chart images.
    pub fn chart_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_dir = Some(path.into());
        self
    }

    /// Set the directory for exported documents.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Put all three storage directories under one root.
    pub fn storage_root(self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.upload_dir(root.join("uploads"))
            .chart_dir(root.join("static"))
            .output_dir(root.join("outputs"))
    }

    /// Set the URL prefix the chart directory is served under.
    pub fn static_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_url_prefix = Some(prefix.into());
        self
    }

    /// Set the maximum number of preview rows.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set the chart size in pixels.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = Some(width);
        self.chart_height = Some(height);
        self
    }

    /// Set the report title.
    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.report_title = Some(title.into());
        self
    }

    /// Set the upload size cap in bytes.
    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = Some(bytes);
        self
    }

    /// Set an explicit `wkhtmltopdf` binary path.
    pub fn wkhtmltopdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.wkhtmltopdf_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ReportConfig` or an error if validation fails.
    pub fn build(self) -> Result<ReportConfig, ConfigValidationError> {
        let defaults = ReportConfig::default();
        let config = ReportConfig {
            upload_dir: self.upload_dir.unwrap_or(defaults.upload_dir),
            chart_dir: self.chart_dir.unwrap_or(defaults.chart_dir),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            static_url_prefix: self
                .static_url_prefix
                .unwrap_or(defaults.static_url_prefix),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
            chart_width: self.chart_width.unwrap_or(defaults.chart_width),
            chart_height: self.chart_height.unwrap_or(defaults.chart_height),
            report_title: self.report_title.unwrap_or(defaults.report_title),
            max_upload_bytes: self.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
            wkhtmltopdf_path: self.wkhtmltopdf_path,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.preview_rows, 30);
        assert_eq!(config.chart_width, 960);
        assert_eq!(config.chart_height, 720);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.chart_dir, PathBuf::from("static"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert!(config.wkhtmltopdf_path.is_none());
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = ReportConfig::builder().build().unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ReportConfig::builder()
            .storage_root("/srv/reports")
            .preview_rows(10)
            .chart_size(640, 480)
            .report_title("Sales")
            .wkhtmltopdf_path("/opt/bin/wkhtmltopdf")
            .build()
            .unwrap();

        assert_eq!(config.upload_dir, PathBuf::from("/srv/reports/uploads"));
        assert_eq!(config.chart_dir, PathBuf::from("/srv/reports/static"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/reports/outputs"));
        assert_eq!(config.preview_rows, 10);
        assert_eq!((config.chart_width, config.chart_height), (640, 480));
        assert_eq!(config.report_title, "Sales");
        assert_eq!(
            config.wkhtmltopdf_path,
            Some(PathBuf::from("/opt/bin/wkhtmltopdf"))
        );
    }

    #[test]
    fn test_validation_zero_preview_rows() {
        let result = ReportConfig::builder().preview_rows(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidPreviewRows(0)
        ));
    }

    #[test]
    fn test_validation_zero_upload_limit() {
        let result = ReportConfig::builder().max_upload_bytes(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidUploadLimit(0)
        ));
    }

    #[test]
    fn test_validation_blank_title() {
        let result = ReportConfig::builder().report_title("   ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyTitle
        ));
    }

    #[test]
    fn test_zero_chart_size_is_accepted_by_builder() {
        // The renderer reports this as a render error instead.
        let config = ReportConfig::builder().chart_size(0, 0).build().unwrap();
        assert_eq!(config.chart_width, 0);
    }

    #[test]
    fn test_artifact_paths() {
        let config = ReportConfig::rooted_at("/data");
        assert_eq!(config.upload_path("abc"), PathBuf::from("/data/uploads/abc.csv"));
        assert_eq!(
            config.chart_path("abc"),
            PathBuf::from("/data/static/chart_abc.png")
        );
        assert_eq!(
            config.document_path("abc"),
            PathBuf::from("/data/outputs/report_abc.pdf")
        );
        assert_eq!(config.chart_url("abc"), "/static/chart_abc.png");
    }

    #[test]
    fn test_chart_url_trims_trailing_slash() {
        let config = ReportConfig::builder()
            .static_url_prefix("/assets/")
            .build()
            .unwrap();
        assert_eq!(config.chart_url("abc"), "/assets/chart_abc.png");
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "upload_dir": "in",
            "preview_rows": 12
        }"#;

        let config: ReportConfig = serde_json::from_str(json).expect("partial config should load");
        assert_eq!(config.upload_dir, PathBuf::from("in"));
        assert_eq!(config.preview_rows, 12);
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.report_title, DEFAULT_REPORT_TITLE);
    }
}
