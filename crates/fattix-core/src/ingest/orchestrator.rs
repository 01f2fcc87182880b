//! Batch orchestrator sequencing extraction, dedup, resolution and
//! persistence over a heterogeneous set of invoice files.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};

use super::{
    ArtifactSink, BatchError, BatchFile, BatchReport, InvoiceRecord, InvoiceRepository,
    SupplierId, SupplierRepository,
};
use crate::error::IngestError;
use crate::models::invoice::ParsedInvoice;
use crate::ocr::PdfTextSource;
use crate::xml::parse_invoice;

/// Batch ingestion orchestrator.
///
/// Runs a single logical worker: files are processed sequentially, one
/// document in flight at a time, which bounds memory and keeps progress
/// deterministic. Not safe for concurrent batches sharing one
/// repository snapshot.
pub struct BatchIngestor<P, S, I, A> {
    pdf_text: P,
    suppliers: S,
    invoices: I,
    artifacts: A,
}

enum FileKind {
    Xml,
    Pdf,
    Other,
}

impl<P, S, I, A> BatchIngestor<P, S, I, A>
where
    P: PdfTextSource,
    S: SupplierRepository,
    I: InvoiceRepository,
    A: ArtifactSink,
{
    pub fn new(pdf_text: P, suppliers: S, invoices: I, artifacts: A) -> Self {
        Self {
            pdf_text,
            suppliers,
            invoices,
            artifacts,
        }
    }

    /// Run one batch. `on_progress` is invoked after each unit of work
    /// with a monotonically non-decreasing percentage in `0..=100`;
    /// extraction and reconciliation each weigh half of the total.
    ///
    /// Per-file and per-invoice failures become report entries and never
    /// abort the batch. Only an unreachable invoice repository aborts
    /// early, and the partial report is still returned.
    pub fn run(&mut self, files: &[BatchFile], mut on_progress: impl FnMut(u8)) -> BatchReport {
        let mut report = BatchReport::default();

        // Dedup snapshot, read once; it is not refreshed mid-batch.
        let known: HashSet<(String, SupplierId)> = match self.invoices.list_known() {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, "invoice repository unreachable, aborting batch");
                report.aborted = Some(e.to_string());
                return report;
            }
        };

        info!(files = files.len(), known = known.len(), "starting batch");

        // Phase 1: extraction.
        let mut parsed: Vec<(String, ParsedInvoice)> = Vec::new();
        for (index, file) in files.iter().enumerate() {
            self.extract_file(file, &mut parsed, &mut report);
            on_progress(phase_percent(0, index + 1, files.len()));
        }

        // Phase 2: reconciliation and persistence, in input order.
        let mut resolved: HashMap<String, SupplierId> = HashMap::new();
        let total = parsed.len();
        for (index, (file_name, invoice)) in parsed.iter().enumerate() {
            self.ingest_invoice(file_name, invoice, &known, &mut resolved, &mut report);
            on_progress(phase_percent(50, index + 1, total));
        }
        on_progress(100);

        info!(
            created = report.created,
            skipped_duplicate = report.skipped_duplicate,
            failed = report.failed,
            errors = report.errors.len(),
            "batch complete"
        );
        report
    }

    /// Phase-1 handling of one file: parse XML into an invoice
    /// candidate, or run OCR on a PDF and persist its text export.
    fn extract_file(
        &mut self,
        file: &BatchFile,
        parsed: &mut Vec<(String, ParsedInvoice)>,
        report: &mut BatchReport,
    ) {
        match classify(&file.name) {
            FileKind::Xml => {
                let text = String::from_utf8_lossy(&file.data);
                match parse_invoice(&text, &file.name) {
                    Ok(invoice) => {
                        debug!(file = %file.name, lines = invoice.lines.len(), "invoice parsed");
                        parsed.push((file.name.clone(), invoice));
                    }
                    Err(e) => record_error(report, &file.name, e.to_string()),
                }
            }
            FileKind::Pdf => match self.pdf_text.extract(&file.data) {
                Ok(result) => {
                    // OCR output is exported as a side artifact only;
                    // scanned invoices do not yet yield candidates.
                    info!(
                        file = %file.name,
                        pages = result.pages.len(),
                        mean_confidence = result.mean_confidence(),
                        "OCR text extracted"
                    );
                    if let Err(e) = self.artifacts.persist_text(&file_stem(&file.name), &result)
                    {
                        record_error(report, &file.name, e.to_string());
                    }
                }
                Err(e) => record_error(report, &file.name, e.to_string()),
            },
            FileKind::Other => {
                record_error(
                    report,
                    &file.name,
                    format!("unsupported file type: {}", file.name),
                );
            }
        }
    }

    /// Phase-2 handling of one parsed invoice.
    fn ingest_invoice(
        &mut self,
        file_name: &str,
        invoice: &ParsedInvoice,
        known: &HashSet<(String, SupplierId)>,
        resolved: &mut HashMap<String, SupplierId>,
        report: &mut BatchReport,
    ) {
        let tax_code = invoice.supplier.tax_code.as_str();

        let supplier_id = match self.resolve(tax_code, resolved) {
            Ok(id) => id,
            Err(e) => {
                report.failed += 1;
                record_error(report, file_name, e.to_string());
                return;
            }
        };

        // A never-before-seen supplier cannot collide: the dedup key
        // uses the resolved identifier, not the raw tax code.
        if let Some(id) = &supplier_id {
            if known.contains(&(invoice.invoice_number.clone(), id.clone())) {
                debug!(
                    invoice = %invoice.invoice_number,
                    supplier = %id,
                    "duplicate invoice skipped"
                );
                report.skipped_duplicate += 1;
                return;
            }
        }

        let supplier_id = match supplier_id {
            Some(id) => id,
            None => match self.suppliers.create_or_associate(&invoice.supplier) {
                Ok(id) => {
                    debug!(tax_code, supplier = %id, "supplier created");
                    resolved.insert(tax_code.to_string(), id.clone());
                    id
                }
                Err(e) => {
                    warn!(tax_code, error = %e, "supplier creation failed");
                    report.failed += 1;
                    record_error(report, file_name, format!("supplier creation failed: {}", e));
                    return;
                }
            },
        };

        let record = InvoiceRecord::from_parsed(invoice, supplier_id);
        match self.invoices.create(&record) {
            Ok(()) => {
                debug!(invoice = %record.invoice_number, "invoice created");
                report.created += 1;
            }
            Err(e) => {
                report.failed += 1;
                record_error(report, file_name, e.to_string());
            }
        }
    }

    /// Resolve a tax code through the batch-scoped index, falling back
    /// to the repository and caching hits.
    fn resolve(
        &mut self,
        tax_code: &str,
        resolved: &mut HashMap<String, SupplierId>,
    ) -> Result<Option<SupplierId>, IngestError> {
        if let Some(id) = resolved.get(tax_code) {
            return Ok(Some(id.clone()));
        }
        let found = self.suppliers.find_by_tax_code(tax_code)?;
        if let Some(id) = &found {
            resolved.insert(tax_code.to_string(), id.clone());
        }
        Ok(found)
    }
}

fn classify(name: &str) -> FileKind {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "xml" => FileKind::Xml,
        "pdf" => FileKind::Pdf,
        _ => FileKind::Other,
    }
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}

fn record_error(report: &mut BatchReport, file_name: &str, reason: String) {
    report.errors.push(BatchError {
        file_name: file_name.to_string(),
        reason,
    });
}

/// Percentage for `done` of `total` units within a 50-point phase
/// starting at `base`. An empty phase contributes its full weight.
fn phase_percent(base: usize, done: usize, total: usize) -> u8 {
    if total == 0 {
        return (base + 50) as u8;
    }
    (base + done * 50 / total) as u8
}
