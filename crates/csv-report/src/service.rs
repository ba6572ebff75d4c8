//! Identifier-keyed report operations.
//!
//! [`ReportService`] is the surface a web or desktop front end calls:
//!
//! - [`accept_upload`](ReportService::accept_upload) validates and stores a CSV
//!   upload under a fresh [`ReportId`]
//! - [`preview`](ReportService::preview) builds the on-screen report
//! - [`download`](ReportService::download) builds and exports the document
//!
//! Unknown or malformed identifiers yield [`ReportError::NotFound`].

use crate::error::{ReportError, Result, ResultExt};
use crate::export::ExportedDocument;
use crate::pipeline::ReportPipeline;
use crate::reporting::HtmlTarget;
use crate::types::ReportDocument;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

static REPORT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{32}$").expect("valid report id regex"));

/// Opaque report identifier: a UUID v4 as 32 lowercase hex digits.
///
/// Parsing rejects anything else, so an identifier can never name a path
/// outside the storage directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportId(String);

impl ReportId {
    /// Allocate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Validate an identifier received from a client.
    ///
    /// A malformed identifier cannot refer to any stored upload, so it is
    /// reported as [`ReportError::NotFound`].
    pub fn parse(raw: &str) -> Result<Self> {
        if REPORT_ID_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ReportError::NotFound(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReportId {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ReportId> for String {
    fn from(id: ReportId) -> Self {
        id.0
    }
}

/// A composed report and its on-screen markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedReport {
    pub document: ReportDocument,
    pub html: String,
}

/// Upload, preview and download over one configured [`ReportPipeline`].
#[derive(Debug)]
pub struct ReportService {
    pipeline: ReportPipeline,
}

impl ReportService {
    pub fn new(pipeline: ReportPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &ReportPipeline {
        &self.pipeline
    }

    /// Validate an upload and persist it as `{id}.csv`.
    ///
    /// Only the filename's extension is checked here; the content is parsed
    /// when the report is generated.
    pub fn accept_upload(&self, filename: Option<&str>, bytes: &[u8]) -> Result<ReportId> {
        let config = self.pipeline.config();
        validate_filename(filename)?;

        if bytes.is_empty() {
            return Err(ReportError::Validation("uploaded file is empty".to_string()));
        }
        if bytes.len() as u64 > config.max_upload_bytes {
            return Err(ReportError::Validation(format!(
                "file exceeds the {} byte upload limit",
                config.max_upload_bytes
            )));
        }

        let id = ReportId::generate();
        let path = config.upload_path(id.as_str());
        std::fs::create_dir_all(&config.upload_dir).context("Creating upload directory")?;
        std::fs::write(&path, bytes).context("Saving upload")?;

        info!("Accepted upload {} ({} bytes)", id, bytes.len());
        Ok(id)
    }

    /// Build the on-screen report for a stored upload.
    pub fn preview(&self, id: &str) -> Result<RenderedReport> {
        let (id, csv_path) = self.stored_upload(id)?;
        let document = self.pipeline.generate_from_path(id.as_str(), &csv_path)?;
        let html = self.pipeline.render_html(&document, HtmlTarget::Screen);
        Ok(RenderedReport { document, html })
    }

    /// Build the report for a stored upload and export it.
    pub fn download(&self, id: &str) -> Result<ExportedDocument> {
        let (id, csv_path) = self.stored_upload(id)?;
        let document = self.pipeline.generate_from_path(id.as_str(), &csv_path)?;
        self.pipeline.export(&document).inspect_err(|e| {
            warn!("Export of report {} failed: {}", id, e);
        })
    }

    fn stored_upload(&self, raw: &str) -> Result<(ReportId, PathBuf)> {
        let id = ReportId::parse(raw)?;
        let path = self.pipeline.config().upload_path(id.as_str());
        if !path.is_file() {
            return Err(ReportError::NotFound(id.to_string()));
        }
        Ok((id, path))
    }
}

fn validate_filename(filename: Option<&str>) -> Result<()> {
    let name = filename.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ReportError::Validation("no file selected".to_string()));
    }

    let is_csv = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(ReportError::Validation(
            "only .csv files are supported".to_string(),
        ));
    }
    Ok(())
}
