//! HTML markup for a [`ReportDocument`].
//!
//! The same document renders in two flavours: [`HtmlTarget::Screen`] links the
//! chart by URL and offers the download link, [`HtmlTarget::Print`] embeds the
//! chart by absolute `file://` path so a local document renderer can resolve it.

use crate::types::{
    ChartArtifact, ColumnProfile, MISSING_MARKER, PreviewTable, ReportDocument, StatisticsTable,
    SummaryStats,
};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const STYLESHEET: &str = "\
body{font-family:Arial,Helvetica,sans-serif;font-size:12px;color:#222;margin:24px;}
h1{font-size:20px;margin-bottom:4px;}
h2{font-size:15px;margin-top:24px;border-bottom:1px solid #ccc;padding-bottom:4px;}
.meta{color:#666;}
.summary td{padding:2px 12px 2px 0;}
.table{border-collapse:collapse;width:100%;margin-top:8px;}
.table th,.table td{border:1px solid #ddd;padding:4px 6px;text-align:left;}
.table th{background:#f3f3f3;}
.table-small td,.table-small th{font-size:11px;}
.chart img{max-width:100%;}
.actions a{display:inline-block;margin-top:16px;padding:8px 12px;border-radius:8px;background:#1f6feb;color:#fff;text-decoration:none;}
";

/// Where the rendered markup will be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlTarget {
    /// Browser view: chart by URL, download link included.
    Screen,
    /// Input for the document renderer: chart by local file path.
    Print,
}

#[derive(Debug, Clone, Copy)]
pub struct HtmlRenderer {
    target: HtmlTarget,
}

impl HtmlRenderer {
    pub fn new(target: HtmlTarget) -> Self {
        Self { target }
    }

    pub fn screen() -> Self {
        Self::new(HtmlTarget::Screen)
    }

    pub fn print() -> Self {
        Self::new(HtmlTarget::Print)
    }

    pub fn target(&self) -> HtmlTarget {
        self.target
    }

    /// Render a complete HTML page.
    pub fn render(&self, doc: &ReportDocument) -> String {
        self.page(doc).into_string()
    }

    fn page(&self, doc: &ReportDocument) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (doc.title) }
                    style { (PreEscaped(STYLESHEET)) }
                }
                body {
                    h1 { (doc.title) }
                    p class="meta" { "Generated at " (doc.summary.generated_at) }

                    (summary_section(&doc.summary))

                    @if let Some(stats) = &doc.statistics {
                        (statistics_section(stats))
                    }

                    @if let Some(chart) = &doc.chart {
                        (self.chart_section(chart))
                    }

                    (preview_section(&doc.preview))

                    @if self.target == HtmlTarget::Screen {
                        div class="actions" {
                            a href={ "/download/" (doc.report_id) ".pdf" } { "Download PDF" }
                        }
                    }
                }
            }
        }
    }

    fn chart_section(&self, chart: &ChartArtifact) -> Markup {
        let src = match self.target {
            HtmlTarget::Screen => chart.url.clone(),
            HtmlTarget::Print => file_url(chart),
        };

        html! {
            h2 { "Chart" }
            div class="chart" {
                img src=(src) alt=(chart.title);
            }
        }
    }
}

fn file_url(chart: &ChartArtifact) -> String {
    let path = std::path::absolute(&chart.path).unwrap_or_else(|_| chart.path.clone());
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

fn summary_section(summary: &SummaryStats) -> Markup {
    html! {
        h2 { "Summary" }
        table class="summary" {
            tr { td { "Rows" } td { (summary.rows) } }
            tr { td { "Columns" } td { (summary.cols) } }
            tr { td { "Missing values" } td { (summary.missing_total) } }
        }
    }
}

/// One header column per profile, one row per metric.
fn statistics_section(stats: &StatisticsTable) -> Markup {
    let metrics: Vec<_> = stats.profiles.iter().map(ColumnProfile::metrics).collect();
    let labels: Vec<&str> = metrics
        .first()
        .map(|row| row.iter().map(|(label, _)| *label).collect())
        .unwrap_or_default();

    html! {
        h2 { "Descriptive statistics" }
        table class="table table-small" {
            thead {
                tr {
                    th {}
                    @for profile in &stats.profiles {
                        th { (profile.column) }
                    }
                }
            }
            tbody {
                @for (i, label) in labels.iter().enumerate() {
                    tr {
                        th { (label) }
                        @for row in &metrics {
                            td { (format_stat(row[i].1)) }
                        }
                    }
                }
            }
        }
    }
}

fn preview_section(preview: &PreviewTable) -> Markup {
    html! {
        h2 { "Data preview (first " (preview.rows.len()) " of " (preview.total_rows) " rows)" }
        table class="table" {
            thead {
                tr {
                    @for header in &preview.headers {
                        th { (header) }
                    }
                }
            }
            tbody {
                @for row in &preview.rows {
                    tr {
                        @for cell in row {
                            td { (cell) }
                        }
                    }
                }
            }
        }
    }
}

/// Statistic printed with three decimals, `NaN` when undefined.
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.3}"),
        _ => MISSING_MARKER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnPair, ColumnProfile};
    use std::path::PathBuf;

    fn document(with_stats: bool, with_chart: bool) -> ReportDocument {
        ReportDocument {
            report_id: "0123456789abcdef0123456789abcdef".to_string(),
            title: "Sales & <Costs>".to_string(),
            summary: SummaryStats {
                rows: 2,
                cols: 2,
                missing_total: 1,
                generated_at: "2024-01-02 03:04:05".to_string(),
            },
            statistics: with_stats.then(|| StatisticsTable {
                profiles: vec![ColumnProfile {
                    column: "amount".to_string(),
                    count: 1,
                    mean: Some(2.5),
                    std: None,
                    min: Some(2.5),
                    p25: Some(2.5),
                    p50: Some(2.5),
                    p75: Some(2.5),
                    max: Some(2.5),
                }],
            }),
            preview: PreviewTable {
                headers: vec!["label".to_string(), "amount".to_string()],
                rows: vec![
                    vec!["a<b".to_string(), "2.5".to_string()],
                    vec!["c".to_string(), "NaN".to_string()],
                ],
                total_rows: 2,
            },
            selection: with_chart.then(|| ColumnPair::new("label", "amount")),
            chart: with_chart.then(|| ChartArtifact {
                path: PathBuf::from("/srv/static/chart_x.png"),
                url: "/static/chart_x.png".to_string(),
                x_label: "label".to_string(),
                y_label: "amount".to_string(),
                title: "amount by label".to_string(),
            }),
        }
    }

    // ==================== format tests ====================

    #[test]
    fn test_format_stat() {
        assert_eq!(format_stat(Some(2.5)), "2.500");
        assert_eq!(format_stat(Some(1.0 / 3.0)), "0.333");
        assert_eq!(format_stat(None), "NaN");
        assert_eq!(format_stat(Some(f64::NAN)), "NaN");
    }

    #[test]
    fn test_format_stat_large_magnitude() {
        let printed = format_stat(Some(2e306));
        assert_ne!(printed, "NaN");
        assert!(printed.ends_with(".000"));
    }

    // ==================== render tests ====================

    #[test]
    fn test_screen_render_links_chart_url_and_download() {
        let html = HtmlRenderer::screen().render(&document(true, true));

        assert!(html.contains("<img src=\"/static/chart_x.png\""));
        assert!(html.contains("/download/0123456789abcdef0123456789abcdef.pdf"));
        assert!(html.contains("<title>Sales &amp; &lt;Costs&gt;</title>"));
        assert!(html.contains("<td>a&lt;b</td>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let mut doc = document(false, true);
        if let Some(chart) = doc.chart.as_mut() {
            chart.title = "\"x\" <by> y".to_string();
        }
        let html = HtmlRenderer::screen().render(&doc);

        assert!(html.contains("alt=\"&quot;x&quot; &lt;by&gt; y\""));
    }

    #[test]
    fn test_print_render_uses_file_url_without_download_link() {
        let html = HtmlRenderer::print().render(&document(true, true));

        assert!(html.contains("src=\"file:///srv/static/chart_x.png\""));
        assert!(!html.contains("/download/"));
    }

    #[test]
    fn test_statistics_table_rows() {
        let html = HtmlRenderer::print().render(&document(true, false));

        assert!(html.contains("Descriptive statistics"));
        assert!(html.contains("<th>amount</th>"));
        assert!(html.contains("<tr><th>count</th><td>1.000</td></tr>"));
        assert!(html.contains("<tr><th>std</th><td>NaN</td></tr>"));
        assert!(html.contains("<tr><th>25%</th><td>2.500</td></tr>"));
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let html = HtmlRenderer::screen().render(&document(false, false));

        assert!(!html.contains("Descriptive statistics"));
        assert!(!html.contains("<img"));
        assert!(html.contains("Data preview (first 2 of 2 rows)"));
        assert!(html.contains("<tr><td>Missing values</td><td>1</td></tr>"));
    }
}
