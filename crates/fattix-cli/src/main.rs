//! CLI application for supplier invoice ingestion.

mod commands;
mod store;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{extract, ingest, parse};

/// Supplier invoice ingestion - parse e-invoices, OCR scanned PDFs,
/// reconcile and persist batches
#[derive(Parser)]
#[command(name = "fattix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single electronic-invoice XML file
    Parse(parse::ParseArgs),

    /// Extract OCR text from a scanned PDF invoice
    Extract(extract::ExtractArgs),

    /// Ingest a batch of invoice files
    Ingest(ingest::IngestArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Parse(args) => parse::run(args).await,
        Commands::Extract(args) => extract::run(args, cli.config.as_deref()).await,
        Commands::Ingest(args) => ingest::run(args, cli.config.as_deref()).await,
    }
}
