//! Document export.
//!
//! The exporter hands report markup to a [`DocumentRenderer`] together with a
//! fixed set of [`ExportOptions`] and publishes the result atomically: the
//! renderer writes into a temporary file next to the target, and only a
//! successful, non-empty result is renamed onto the final path.

mod wkhtmltopdf;

pub use wkhtmltopdf::WkhtmltopdfRenderer;

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// File name suggested to clients downloading a report.
pub const DOWNLOAD_FILE_NAME: &str = "output_report.pdf";

/// Page and encoding settings passed to the document renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub encoding: String,
    pub page_size: String,
    pub margin_top: String,
    pub margin_right: String,
    pub margin_bottom: String,
    pub margin_left: String,
    /// Lets the renderer load images referenced by `file://` URLs.
    pub enable_local_file_access: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            page_size: "A4".to_string(),
            margin_top: "12mm".to_string(),
            margin_right: "12mm".to_string(),
            margin_bottom: "12mm".to_string(),
            margin_left: "12mm".to_string(),
            enable_local_file_access: true,
        }
    }
}

impl ExportOptions {
    /// Command-line flags in the form understood by `wkhtmltopdf`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--encoding".to_string(),
            self.encoding.clone(),
            "--page-size".to_string(),
            self.page_size.clone(),
            "--margin-top".to_string(),
            self.margin_top.clone(),
            "--margin-right".to_string(),
            self.margin_right.clone(),
            "--margin-bottom".to_string(),
            self.margin_bottom.clone(),
            "--margin-left".to_string(),
            self.margin_left.clone(),
        ];
        if self.enable_local_file_access {
            args.push("--enable-local-file-access".to_string());
        }
        args
    }
}

/// Converts HTML into a paginated document.
///
/// Implementations write the complete document to `output` and return an
/// error when the conversion fails for any reason.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, html: &str, options: &ExportOptions, output: &Path) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// A document that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedDocument {
    pub path: PathBuf,
    pub download_name: String,
}

/// Publishes rendered documents without ever exposing partial output.
#[derive(Clone)]
pub struct DocumentExporter {
    renderer: Arc<dyn DocumentRenderer>,
    options: ExportOptions,
}

impl std::fmt::Debug for DocumentExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExporter")
            .field("renderer", &self.renderer.name())
            .field("options", &self.options)
            .finish()
    }
}

impl DocumentExporter {
    pub fn new(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            renderer,
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Render `html` and publish it at `target`.
    ///
    /// On failure the previous file at `target`, if any, is left untouched.
    pub fn export(&self, html: &str, target: &Path) -> Result<ExportedDocument> {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| {
            ReportError::Export(format!("cannot create {}: {e}", dir.display()))
        })?;

        let staging = tempfile::Builder::new()
            .prefix(".report_")
            .suffix(".pdf.partial")
            .tempfile_in(dir)
            .map_err(|e| ReportError::Export(format!("cannot stage document: {e}")))?;

        debug!(
            "Rendering document with {} into {}",
            self.renderer.name(),
            staging.path().display()
        );
        self.renderer
            .render(html, &self.options, staging.path())
            .map_err(into_export_error)?;

        let size = std::fs::metadata(staging.path())
            .map_err(|e| ReportError::Export(format!("rendered document unreadable: {e}")))?
            .len();
        if size == 0 {
            return Err(ReportError::Export(
                "document renderer produced an empty file".to_string(),
            ));
        }

        staging
            .persist(target)
            .map_err(|e| ReportError::Export(format!("cannot write {}: {e}", target.display())))?;

        info!("Exported {} ({} bytes)", target.display(), size);
        Ok(ExportedDocument {
            path: target.to_path_buf(),
            download_name: DOWNLOAD_FILE_NAME.to_string(),
        })
    }
}

fn into_export_error(e: ReportError) -> ReportError {
    match e {
        ReportError::Export(_) => e,
        other => ReportError::Export(other.to_string()),
    }
}
