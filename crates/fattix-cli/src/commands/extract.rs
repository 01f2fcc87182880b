//! Extract command - OCR a scanned PDF invoice into plain text.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use fattix_core::{EmbeddedImageRasterizer, PureOcrEngine, TextExtractor};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output text file (default: input with .txt extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| config.ocr.model_dir.clone());

    info!("Extracting text from {}", args.input.display());

    let extractor = TextExtractor::new(
        EmbeddedImageRasterizer,
        PureOcrEngine::from_dir(&model_dir),
    )
    .with_config(config.ocr);

    let data = fs::read(&args.input)?;
    let result = extractor.extract(&data)?;

    println!(
        "{} Recognized {} pages (mean confidence {:.1})",
        style("✓").green(),
        result.pages.len(),
        result.mean_confidence()
    );
    for page in &result.pages {
        println!(
            "  page {:>3}: {:>4} lines, confidence {:.1}",
            page.page_number,
            page.lines.len(),
            page.confidence
        );
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("txt"));
    fs::write(&output_path, result.full_text())?;

    println!(
        "{} Text export written to {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}
