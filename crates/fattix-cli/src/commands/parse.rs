//! Parse command - run the e-invoice parser on a single XML file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use fattix_core::{parse_invoice, ParsedInvoice};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input e-invoice XML file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let file_name = args
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    info!("Parsing e-invoice: {}", args.input.display());

    let xml_text = fs::read_to_string(&args.input)?;
    let invoice = parse_invoice(&xml_text, &file_name)?;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&invoice)?,
        OutputFormat::Text => format_invoice_text(&invoice),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Wrote {} to {}",
            style("✓").green(),
            invoice.file_id,
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn format_invoice_text(invoice: &ParsedInvoice) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", invoice.invoice_number));
    output.push_str(&format!("Date: {}\n", invoice.invoice_date));
    output.push_str(&format!("Total: {}\n", invoice.total_amount));
    output.push('\n');

    output.push_str("Supplier:\n");
    output.push_str(&format!("  {}\n", invoice.supplier.name));
    output.push_str(&format!("  Tax code: {}\n", invoice.supplier.tax_code));
    if !invoice.supplier.address.is_empty() {
        output.push_str(&format!(
            "  {} {}, {} {}\n",
            invoice.supplier.address,
            invoice.supplier.civic_number,
            invoice.supplier.postal_code,
            invoice.supplier.city
        ));
    }
    output.push('\n');

    output.push_str(&format!("Lines ({}):\n", invoice.lines.len()));
    for line in &invoice.lines {
        output.push_str(&format!(
            "  {:>3}. {} x {} {} @ {} = {} [{}:{}]\n",
            line.line_number,
            line.description,
            line.quantity,
            line.unit_of_measure,
            line.unit_price,
            line.total_price,
            line.code_type,
            line.article_code
        ));
    }

    output
}
