//! Integration tests for the CSV report pipeline.
//!
//! These tests drive the service end to end (upload, preview, download) with
//! in-memory chart and document renderers, so they need neither system fonts
//! nor an external PDF binary.

use csv_report::{
    ChartRenderer, ChartSpec, ColumnPair, DocumentRenderer, ExportOptions, ReportConfig,
    ReportError, ReportId, ReportPipeline, ReportResult, ReportService, ReportStage,
};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(filename: &str) -> Vec<u8> {
    std::fs::read(fixtures_path().join(filename)).expect("Failed to read fixture")
}

/// Writes a small stub image and remembers every spec it was given.
#[derive(Default)]
struct StubChart {
    specs: Mutex<Vec<ChartSpec>>,
}

impl ChartRenderer for StubChart {
    fn render(&self, spec: &ChartSpec, path: &Path) -> ReportResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("chart:{}", spec.title))?;
        self.specs.lock().unwrap().push(spec.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "stub-chart"
    }
}

/// Writes the markup it receives as the "document".
struct StubDocument;

impl DocumentRenderer for StubDocument {
    fn render(&self, html: &str, _options: &ExportOptions, output: &Path) -> ReportResult<()> {
        std::fs::write(output, html)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stub-document"
    }
}

/// Starts writing, then fails like a crashing converter.
struct BrokenDocument;

impl DocumentRenderer for BrokenDocument {
    fn render(&self, _html: &str, _options: &ExportOptions, output: &Path) -> ReportResult<()> {
        std::fs::write(output, b"%PDF-1.4 partial")?;
        Err(ReportError::Export("converter exited with status 1".to_string()))
    }

    fn name(&self) -> &str {
        "broken-document"
    }
}

struct Harness {
    root: TempDir,
    chart: Arc<StubChart>,
    service: ReportService,
}

impl Harness {
    fn new() -> Self {
        Self::with_document_renderer(Arc::new(StubDocument))
    }

    fn with_document_renderer(renderer: Arc<dyn DocumentRenderer>) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let chart = Arc::new(StubChart::default());
        let service = service_at(root.path(), chart.clone(), renderer);
        Self {
            root,
            chart,
            service,
        }
    }

    fn upload(&self, filename: &str, bytes: &[u8]) -> ReportId {
        self.service
            .accept_upload(Some(filename), bytes)
            .expect("Upload should be accepted")
    }
}

fn service_at(
    root: &Path,
    chart: Arc<dyn ChartRenderer>,
    document: Arc<dyn DocumentRenderer>,
) -> ReportService {
    let pipeline = ReportPipeline::builder()
        .config(ReportConfig::rooted_at(root))
        .chart_renderer(chart)
        .document_renderer(document)
        .build()
        .expect("Valid pipeline");
    ReportService::new(pipeline)
}

fn amounts_csv(rows: usize) -> Vec<u8> {
    let mut csv = String::from("amount,label\n");
    for i in 0..rows {
        csv.push_str(&format!("{},item-{}\n", i * 10, i));
    }
    csv.into_bytes()
}

// ============================================================================
// End-to-End Examples
// ============================================================================

#[test]
fn test_two_numeric_columns_chart_first_pair() {
    let h = Harness::new();
    let id = h.upload("scores.csv", &fixture("scores.csv"));

    let report = h.service.preview(id.as_str()).unwrap();
    let doc = &report.document;

    assert_eq!(doc.summary.rows, 5);
    assert_eq!(doc.summary.cols, 3);
    assert_eq!(doc.selection, Some(ColumnPair::new("score", "age")));

    let stats = doc.statistics.as_ref().expect("statistics table");
    let names: Vec<_> = stats.profiles.iter().map(|p| p.column.as_str()).collect();
    assert_eq!(names, vec!["score", "age"]);

    let chart = doc.chart.as_ref().expect("chart");
    assert_eq!(chart.x_label, "score");
    assert_eq!(chart.y_label, "age");
    assert_eq!(chart.title, "age by score");
    assert!(report.html.contains(&format!("/static/chart_{id}.png")));
    assert!(report.html.contains(&format!("/download/{id}.pdf")));
}

#[test]
fn test_text_only_dataset_has_no_statistics_or_chart() {
    let h = Harness::new();
    let id = h.upload("cities.csv", &fixture("cities.csv"));

    let doc = h.service.preview(id.as_str()).unwrap().document;

    assert_eq!(doc.selection, None);
    assert!(doc.statistics.is_none());
    assert!(doc.chart.is_none());
    assert_eq!(doc.preview.rows.len(), 10);
    assert!(h.chart.specs.lock().unwrap().is_empty());
}

#[test]
fn test_single_numeric_column_pairs_with_first_text_column() {
    let h = Harness::new();
    let id = h.upload("amounts.csv", &amounts_csv(50));

    let doc = h.service.preview(id.as_str()).unwrap().document;

    assert_eq!(doc.selection, Some(ColumnPair::new("label", "amount")));
    assert_eq!(doc.preview.rows.len(), 30);
    assert_eq!(doc.preview.total_rows, 50);
    assert_eq!(doc.preview.rows[0], vec!["0", "item-0"]);
    assert_eq!(doc.preview.rows[29], vec!["290", "item-29"]);

    let specs = h.chart.specs.lock().unwrap();
    let categories = specs[0].x_categories.as_ref().expect("categorical x axis");
    assert_eq!(categories.len(), 50);
    // "item-0" < "item-1" < "item-10" < ... lexicographically
    assert_eq!(categories[..3], ["item-0", "item-1", "item-10"]);
}

// ============================================================================
// Statistics and Missing Values
// ============================================================================

#[test]
fn test_missing_total_matches_per_column_counts() {
    let h = Harness::new();
    let id = h.upload("sparse.csv", &fixture("sparse.csv"));

    let doc = h.service.preview(id.as_str()).unwrap().document;

    // region 1, units 2, price 1, note 3
    assert_eq!(doc.summary.missing_total, 7);
    assert_eq!(doc.selection, Some(ColumnPair::new("units", "price")));

    let stats = doc.statistics.expect("statistics table");
    let units = &stats.profiles[0];
    assert_eq!(units.column, "units");
    assert_eq!(units.count, 3);
    assert_eq!(units.mean, Some(9.667));
    assert_eq!(units.min, Some(7.0));
    assert_eq!(units.max, Some(12.0));
}

#[test]
fn test_statistics_rounded_to_three_decimals() {
    let h = Harness::new();
    let id = h.upload("scores.csv", &fixture("scores.csv"));

    let doc = h.service.preview(id.as_str()).unwrap().document;

    for profile in doc.statistics.unwrap().profiles {
        for (label, value) in profile.metrics() {
            let v = value.unwrap_or_else(|| panic!("{label} should be defined"));
            assert_eq!((v * 1000.0).round() / 1000.0, v, "{label} = {v}");
        }
    }
}

#[test]
fn test_padded_numeric_cells_chart_both_columns() {
    let h = Harness::new();
    let id = h.upload("padded.csv", b"a, b\n1, 2\n3, 4\n");

    let doc = h.service.preview(id.as_str()).unwrap().document;

    assert_eq!(doc.selection, Some(ColumnPair::new("a", " b")));
    let stats = doc.statistics.expect("statistics table");
    assert_eq!(stats.profiles.len(), 2);
    assert_eq!(stats.profiles[1].mean, Some(3.0));
}

#[test]
fn test_nan_spelling_counts_as_missing() {
    let h = Harness::new();
    let id = h.upload("nan.csv", b"v\n1\nNAN\n3\n");

    let doc = h.service.preview(id.as_str()).unwrap().document;

    assert_eq!(doc.summary.missing_total, 1);
    let v = &doc.statistics.expect("statistics table").profiles[0];
    assert_eq!(v.count, 2);
    assert_eq!(v.mean, Some(2.0));
    assert_eq!(v.p50, Some(2.0));
}

#[test]
fn test_huge_values_are_not_reported_as_nan() {
    let h = Harness::new();
    let id = h.upload("huge.csv", b"v\n1e306\n2e306\n");

    let report = h.service.preview(id.as_str()).unwrap();

    let v = &report.document.statistics.as_ref().expect("statistics table").profiles[0];
    assert_eq!(v.min, Some(1e306));
    assert_eq!(v.max, Some(2e306));
    assert!(!report.html.contains("<tr><th>max</th><td>NaN</td></tr>"));
}

// ============================================================================
// Re-runs and Downloads
// ============================================================================

#[test]
fn test_rerun_is_idempotent() {
    let h = Harness::new();
    let id = h.upload("scores.csv", &fixture("scores.csv"));

    let first = h.service.preview(id.as_str()).unwrap().document;
    let second = h.service.preview(id.as_str()).unwrap().document;

    assert_eq!(first.statistics, second.statistics);
    assert_eq!(first.preview, second.preview);
    assert_eq!(first.chart, second.chart);

    let specs = h.chart.specs.lock().unwrap();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0], specs[1]);

    let charts: Vec<_> = std::fs::read_dir(h.root.path().join("static"))
        .unwrap()
        .collect();
    assert_eq!(charts.len(), 1, "re-runs overwrite the same chart file");
}

#[test]
fn test_download_exports_document() {
    let h = Harness::new();
    let id = h.upload("scores.csv", &fixture("scores.csv"));

    let first = h.service.download(id.as_str()).unwrap();
    let second = h.service.download(id.as_str()).unwrap();

    let expected = h.root.path().join("outputs").join(format!("report_{id}.pdf"));
    assert_eq!(first.path, expected);
    assert_eq!(second.path, expected);
    assert_eq!(first.download_name, "output_report.pdf");

    let markup = std::fs::read_to_string(&expected).unwrap();
    assert!(markup.contains("file://"), "print markup embeds the chart by file path");
    assert!(markup.contains("age by score"));
}

#[test]
fn test_export_failure_keeps_previous_document_and_preview() {
    let h = Harness::new();
    let id = h.upload("scores.csv", &fixture("scores.csv"));
    let good = h.service.download(id.as_str()).unwrap();
    let before = std::fs::read(&good.path).unwrap();

    let broken = service_at(
        h.root.path(),
        Arc::new(StubChart::default()),
        Arc::new(BrokenDocument),
    );
    let err = broken.download(id.as_str()).unwrap_err();

    assert_eq!(err.error_code(), "EXPORT_ERROR");
    assert!(!err.is_recoverable());
    assert_eq!(std::fs::read(&good.path).unwrap(), before);

    let outputs: Vec<_> = std::fs::read_dir(h.root.path().join("outputs"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(outputs.len(), 1, "no partial file may be left behind");

    assert!(broken.preview(id.as_str()).is_ok());
}

#[test]
fn test_export_failure_without_previous_document() {
    let h = Harness::with_document_renderer(Arc::new(BrokenDocument));
    let id = h.upload("scores.csv", &fixture("scores.csv"));

    assert!(h.service.download(id.as_str()).is_err());
    assert!(!h.root.path().join("outputs").join(format!("report_{id}.pdf")).exists());
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_unknown_report_is_not_found() {
    let h = Harness::new();
    let unknown = ReportId::generate();

    assert!(h.service.preview(unknown.as_str()).unwrap_err().is_not_found());
    assert!(h.service.download(unknown.as_str()).unwrap_err().is_not_found());
    assert!(h.service.preview("../../etc/passwd").unwrap_err().is_not_found());
}

#[test]
fn test_upload_validation() {
    let h = Harness::new();

    let err = h.service.accept_upload(None, b"a\n1\n").unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(err.is_recoverable());

    let err = h.service.accept_upload(Some("data.txt"), b"a\n1\n").unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    assert!(h.service.accept_upload(Some("DATA.CSV"), b"a\n1\n").is_ok());
}

#[test]
fn test_ragged_rows_fail_with_parse_error() {
    let h = Harness::new();
    let id = h.upload("ragged.csv", &fixture("ragged.csv"));

    let err = h.service.preview(id.as_str()).unwrap_err();

    assert_eq!(err.error_code(), "PARSE_ERROR");
    assert!(!err.is_recoverable());
    assert!(!h.root.path().join("static").exists(), "no chart for a failed parse");
}

// ============================================================================
// Progress and Serialization
// ============================================================================

#[test]
fn test_progress_reports_loading_through_complete() {
    let root = tempfile::tempdir().unwrap();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let pipeline = ReportPipeline::builder()
        .config(ReportConfig::rooted_at(root.path()))
        .chart_renderer(Arc::new(StubChart::default()))
        .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
        .build()
        .unwrap();
    let service = ReportService::new(pipeline);
    let id = service
        .accept_upload(Some("scores.csv"), &fixture("scores.csv"))
        .unwrap();

    service.preview(id.as_str()).unwrap();

    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&ReportStage::Loading));
    assert_eq!(stages.last(), Some(&ReportStage::Complete));
    assert!(stages.contains(&ReportStage::Charting));
}

#[test]
fn test_document_serializes_to_json() {
    let h = Harness::new();
    let id = h.upload("sparse.csv", &fixture("sparse.csv"));

    let doc = h.service.preview(id.as_str()).unwrap().document;
    let json = serde_json::to_value(&doc).unwrap();

    assert_eq!(json["report_id"], id.as_str());
    assert_eq!(json["summary"]["missing_total"], 7);
    assert_eq!(json["selection"]["x"], "units");
    assert_eq!(json["preview"]["headers"][3], "note");
}
