//! Custom error types for the report pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. The variants
//! mirror how a failure is surfaced to the end user:
//!
//! - [`ReportError::Validation`] - bad upload, recoverable at the boundary
//! - [`ReportError::Parse`] - malformed CSV, report generation fails
//! - [`ReportError::NotFound`] - unknown report identifier
//! - [`ReportError::Render`] - chart could not be drawn
//! - [`ReportError::Export`] - document renderer failed, download only
//!
//! Errors are serializable so a web or desktop front end can display them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    /// No file supplied, or the file is not an accepted CSV upload.
    #[error("Invalid upload: {0}")]
    Validation(String),

    /// The tabular input is malformed (ragged rows, undecodable bytes).
    #[error("Failed to parse CSV: {0}")]
    Parse(String),

    /// No stored input exists for the requested report identifier.
    #[error("Report '{0}' not found")]
    NotFound(String),

    /// The chart image could not be produced.
    #[error("Failed to render chart: {0}")]
    Render(String),

    /// The external document renderer failed.
    #[error("Failed to export document: {0}")]
    Export(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// CSV reader error wrapper.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReportError>,
    },
}

impl ReportError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReportError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Render(_) => "RENDER_ERROR",
            Self::Export(_) => "EXPORT_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error means the requested report does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if the caller can recover by re-prompting the user.
    ///
    /// Parse, render and export failures abort the current request.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::NotFound(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ReportError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ReportError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReportError::Io(e).with_context(context))
    }
}
