//! Ingest command - batch processing of invoice files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use fattix_core::{
    BatchFile, BatchIngestor, BatchReport, EmbeddedImageRasterizer, PureOcrEngine, TextExtractor,
};

use crate::store::{FileArtifactSink, InvoiceStore, SupplierStore};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Store directory (suppliers.json, invoices.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Directory for OCR text exports
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Also write a summary.csv with the per-file failures
    #[arg(long)]
    summary: bool,
}

pub async fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    // Expand glob pattern
    let paths: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "xml" | "pdf")
        })
        .collect();

    if paths.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to ingest",
        style("ℹ").blue(),
        paths.len()
    );

    // Read the batch up front; the orchestrator works on bytes only
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        files.push(BatchFile::new(name, fs::read(path)?));
    }

    // Open the store and the artifact directory
    let store_dir = args
        .store
        .clone()
        .unwrap_or_else(|| config.ingest.store_dir.clone());
    fs::create_dir_all(&store_dir)?;
    let mut suppliers = SupplierStore::open(&store_dir.join("suppliers.json"))?;
    let mut invoices = InvoiceStore::open(&store_dir.join("invoices.json"))?;
    debug!(
        suppliers = suppliers.len(),
        invoices = invoices.len(),
        "store opened"
    );

    let artifact_dir = args
        .artifacts
        .clone()
        .unwrap_or_else(|| config.ingest.artifact_dir.clone());
    let mut artifacts = FileArtifactSink::new(&artifact_dir)?;

    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| config.ocr.model_dir.clone());
    let extractor = TextExtractor::new(
        EmbeddedImageRasterizer,
        PureOcrEngine::from_dir(&model_dir),
    )
    .with_config(config.ocr.clone());

    info!(
        files = files.len(),
        store = %store_dir.display(),
        "starting ingestion batch"
    );

    // Progress bar driven by the orchestrator's callback
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}%")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut ingestor =
        BatchIngestor::new(extractor, &mut suppliers, &mut invoices, &mut artifacts);
    let report = ingestor.run(&files, |percent| pb.set_position(percent as u64));

    pb.finish_with_message("Complete");
    debug!("batch finished in {:?}", start.elapsed());

    print_report(&report, files.len(), start);

    if args.summary {
        let summary_path = store_dir.join("summary.csv");
        write_summary(&summary_path, &report)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    if report.aborted.is_some() {
        anyhow::bail!("batch aborted early");
    }
    Ok(())
}

fn print_report(report: &BatchReport, file_count: usize, start: Instant) {
    println!();
    println!(
        "{} Processed {} files in {:?} (completed {})",
        style("✓").green(),
        file_count,
        start.elapsed(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "   {} created, {} duplicates skipped, {} failed",
        style(report.created).green(),
        style(report.skipped_duplicate).yellow(),
        style(report.failed).red()
    );

    if let Some(reason) = &report.aborted {
        println!();
        println!("{} Batch aborted early: {}", style("✗").red(), reason);
    }

    if !report.errors.is_empty() {
        println!();
        println!("{}", style("Failures:").red());
        for error in &report.errors {
            println!("  - {}: {}", error.file_name, error.reason);
        }
    }
}

fn write_summary(path: &PathBuf, report: &BatchReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file_name", "reason"])?;
    for error in &report.errors {
        wtr.write_record([error.file_name.as_str(), error.reason.as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}
