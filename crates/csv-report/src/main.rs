//! CLI entry point for the CSV report generator.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use csv_report::{ExportedDocument, ReportConfig, ReportDocument, ReportPipeline, ReportService};
use dotenv::dotenv;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Environment variable naming the `wkhtmltopdf` binary when `--wkhtmltopdf`
/// is not given.
const WKHTMLTOPDF_ENV: &str = "CSV_REPORT_WKHTMLTOPDF";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Analytical report generator for CSV files",
    long_about = "Reads a CSV file and writes an HTML report with summary counts, \
                  descriptive statistics, a data preview and a chart.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  CSV_REPORT_WKHTMLTOPDF    Path to the wkhtmltopdf binary (used with --pdf)\n\n\
                  EXAMPLES:\n  \
                  # HTML report under ./outputs\n  \
                  csv-report -i data.csv\n\n  \
                  # Also export a PDF\n  \
                  csv-report -i data.csv --pdf\n\n  \
                  # Machine-readable output\n  \
                  csv-report -i data.csv --json | jq .document.summary"
)]
struct Args {
    /// Path to the CSV file to report on
    #[arg(short, long)]
    input: PathBuf,

    /// Storage root for uploads, charts, exported documents and the HTML report
    #[arg(short, long, default_value = "./outputs")]
    output_dir: PathBuf,

    /// Also export the report as PDF
    #[arg(long)]
    pdf: bool,

    /// Explicit path to the wkhtmltopdf binary
    #[arg(long)]
    wkhtmltopdf: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON document.
    #[arg(long)]
    json: bool,
}

/// Everything the CLI produced for one input.
#[derive(Debug, Serialize)]
struct CliOutput<'a> {
    report_id: &'a str,
    html_path: PathBuf,
    pdf: Option<&'a ExportedDocument>,
    document: &'a ReportDocument,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !args.input.is_file() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let service = ReportService::new(build_pipeline(&args)?);
    run(&service, &args).inspect_err(|e| error!("Report failed: {:#}", e))
}

fn build_pipeline(args: &Args) -> Result<ReportPipeline> {
    // The HTML report sits in the storage root, so charts are linked relative to it.
    let mut builder = ReportConfig::builder()
        .storage_root(&args.output_dir)
        .static_url_prefix("static");

    if let Some(path) = args
        .wkhtmltopdf
        .clone()
        .or_else(|| std::env::var_os(WKHTMLTOPDF_ENV).map(PathBuf::from))
    {
        debug!("Using wkhtmltopdf at {}", path.display());
        builder = builder.wkhtmltopdf_path(path);
    }

    let pipeline = ReportPipeline::builder()
        .config(builder.build()?)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;
    Ok(pipeline)
}

fn run(service: &ReportService, args: &Args) -> Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let filename = args.input.file_name().and_then(|n| n.to_str());

    info!("Loading dataset from: {}", args.input.display());
    let id = service.accept_upload(filename, &bytes)?;
    let rendered = service.preview(id.as_str())?;

    let config = service.pipeline().config();
    let html_path = args.output_dir.join(format!("report_{id}.html"));
    std::fs::write(&html_path, &rendered.html)
        .with_context(|| format!("Failed to write {}", html_path.display()))?;
    info!("HTML report written to: {}", html_path.display());

    let pdf = if args.pdf {
        Some(service.pipeline().export(&rendered.document)?)
    } else {
        None
    };

    if args.json {
        let output = CliOutput {
            report_id: id.as_str(),
            html_path,
            pdf: pdf.as_ref(),
            document: &rendered.document,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_human_readable_summary(&rendered.document, &html_path, pdf.as_ref(), &config.upload_dir);
    Ok(())
}

/// Print a human-readable summary of the generated report.
fn print_human_readable_summary(
    document: &ReportDocument,
    html_path: &Path,
    pdf: Option<&ExportedDocument>,
    upload_dir: &Path,
) {
    let summary = &document.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("{}", document.title);
    println!("{}", "=".repeat(80));
    println!();

    println!("Report ID: {}", document.report_id);
    println!("Generated: {}", summary.generated_at);
    println!("Upload:    {}", upload_dir.display());
    println!();

    println!("Dataset:");
    println!("  Rows: {}", summary.rows);
    println!("  Columns: {}", summary.cols);
    println!("  Missing values: {}", summary.missing_total);
    println!();

    match &document.statistics {
        Some(stats) => {
            println!("Numeric columns:");
            for profile in &stats.profiles {
                println!(
                    "  {:<20} count={:<6} mean={:<10} std={}",
                    truncate_str(&profile.column, 19),
                    profile.count,
                    csv_report::reporting::format_stat(profile.mean),
                    csv_report::reporting::format_stat(profile.std)
                );
            }
        }
        None => println!("Numeric columns: none"),
    }
    println!();

    match &document.chart {
        Some(chart) => println!("Chart: {} ({})", chart.title, chart.path.display()),
        None => println!("Chart: none (no suitable column pair)"),
    }
    println!("HTML:  {}", html_path.display());
    if let Some(pdf) = pdf {
        println!("PDF:   {}", pdf.path.display());
    }

    println!();
    println!("Use --json for machine-readable output");
    println!("Use --pdf to export a PDF document");
    println!("{}", "=".repeat(80));
}

/// Truncate a string to `max_len` characters, adding "..." when shortened.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
