use super::{DocumentRenderer, ExportOptions};
use crate::error::{ReportError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

const DEFAULT_BINARY: &str = "wkhtmltopdf";

/// Renders PDF documents with the external `wkhtmltopdf` binary.
///
/// Markup is streamed on stdin; the binary writes the document to the output
/// path itself.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    binary: PathBuf,
}

impl Default for WkhtmltopdfRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl WkhtmltopdfRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Use `binary` when given, else `wkhtmltopdf` from `PATH`.
    pub fn from_optional(binary: Option<&Path>) -> Self {
        binary.map(Self::new).unwrap_or_default()
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl DocumentRenderer for WkhtmltopdfRenderer {
    fn render(&self, html: &str, options: &ExportOptions, output: &Path) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .args(options.to_args())
            .arg("--quiet")
            .arg("-")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReportError::Export(format!(
                    "cannot start {}: {e}",
                    self.binary.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReportError::Export("renderer stdin unavailable".to_string()))?;

        // Feed stdin from another thread so a full stderr pipe cannot deadlock us.
        let markup = html.to_owned();
        let writer = std::thread::spawn(move || stdin.write_all(markup.as_bytes()));

        let result = child
            .wait_with_output()
            .map_err(|e| ReportError::Export(format!("renderer did not finish: {e}")))?;
        let written = writer
            .join()
            .map_err(|_| ReportError::Export("stdin writer panicked".to_string()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ReportError::Export(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                result.status,
                stderr.trim()
            )));
        }
        written.map_err(|e| ReportError::Export(format!("cannot send markup: {e}")))?;

        debug!("{} wrote {}", self.binary.display(), output.display());
        Ok(())
    }

    fn name(&self) -> &str {
        DEFAULT_BINARY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_optional() {
        assert_eq!(
            WkhtmltopdfRenderer::from_optional(None).binary(),
            Path::new("wkhtmltopdf")
        );
        assert_eq!(
            WkhtmltopdfRenderer::from_optional(Some(Path::new("/opt/bin/wkhtmltopdf"))).binary(),
            Path::new("/opt/bin/wkhtmltopdf")
        );
    }

    #[test]
    fn test_missing_binary_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = WkhtmltopdfRenderer::new(dir.path().join("no-such-binary"));

        let err = renderer
            .render("<p>x</p>", &ExportOptions::default(), &dir.path().join("out.pdf"))
            .unwrap_err();

        assert_eq!(err.error_code(), "EXPORT_ERROR");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_binary_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = WkhtmltopdfRenderer::new("false");

        let err = renderer
            .render("<p>x</p>", &ExportOptions::default(), &dir.path().join("out.pdf"))
            .unwrap_err();

        assert_eq!(err.error_code(), "EXPORT_ERROR");
        assert!(err.to_string().contains("exited with"));
    }
}
