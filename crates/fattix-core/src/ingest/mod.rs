//! Batch ingestion: deduplication, supplier resolution, persistence.
//!
//! The repositories are external collaborators. Every call returns its
//! completion result directly, scoped to that request; there is no
//! shared in-flight flag to poll and no ambient state store. Project
//! scoping is carried by the repository instance itself.

mod orchestrator;

pub use orchestrator::BatchIngestor;

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::models::invoice::{InvoiceLine, ParsedInvoice, SupplierCandidate};
use crate::ocr::OcrResult;

/// Opaque supplier identifier assigned by the supplier repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub String);

impl fmt::Display for SupplierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistence request: a parsed invoice bound to its resolved supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub file_id: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub total_amount: Decimal,
    pub supplier_id: SupplierId,
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceRecord {
    /// Build a persistence request from a parsed invoice.
    pub fn from_parsed(invoice: &ParsedInvoice, supplier_id: SupplierId) -> Self {
        Self {
            file_id: invoice.file_id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            invoice_date: invoice.invoice_date.clone(),
            total_amount: invoice.total_amount,
            supplier_id,
            lines: invoice.lines.clone(),
        }
    }
}

/// External supplier repository.
pub trait SupplierRepository {
    /// Resolve a tax code to a supplier identifier, if one is recorded.
    fn find_by_tax_code(&self, tax_code: &str) -> Result<Option<SupplierId>, IngestError>;

    /// Create the supplier, or associate the candidate with an existing
    /// record for the same tax code. Returns once the backend has
    /// committed.
    fn create_or_associate(
        &mut self,
        candidate: &SupplierCandidate,
    ) -> Result<SupplierId, IngestError>;
}

/// External invoice repository.
pub trait InvoiceRepository {
    /// All recorded `(invoice number, supplier)` pairs, read once at
    /// batch start as the dedup snapshot.
    fn list_known(&self) -> Result<Vec<(String, SupplierId)>, IngestError>;

    /// Persist one invoice. Returns once the backend has committed.
    fn create(&mut self, record: &InvoiceRecord) -> Result<(), IngestError>;
}

/// Destination for OCR text exports produced as batch side artifacts.
pub trait ArtifactSink {
    fn persist_text(&mut self, file_id: &str, result: &OcrResult) -> Result<(), IngestError>;
}

/// Sink for callers that do not keep OCR exports.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardArtifacts;

impl ArtifactSink for DiscardArtifacts {
    fn persist_text(&mut self, _file_id: &str, _result: &OcrResult) -> Result<(), IngestError> {
        Ok(())
    }
}

impl<T: SupplierRepository + ?Sized> SupplierRepository for &mut T {
    fn find_by_tax_code(&self, tax_code: &str) -> Result<Option<SupplierId>, IngestError> {
        (**self).find_by_tax_code(tax_code)
    }

    fn create_or_associate(
        &mut self,
        candidate: &SupplierCandidate,
    ) -> Result<SupplierId, IngestError> {
        (**self).create_or_associate(candidate)
    }
}

impl<T: InvoiceRepository + ?Sized> InvoiceRepository for &mut T {
    fn list_known(&self) -> Result<Vec<(String, SupplierId)>, IngestError> {
        (**self).list_known()
    }

    fn create(&mut self, record: &InvoiceRecord) -> Result<(), IngestError> {
        (**self).create(record)
    }
}

impl<T: ArtifactSink + ?Sized> ArtifactSink for &mut T {
    fn persist_text(&mut self, file_id: &str, result: &OcrResult) -> Result<(), IngestError> {
        (**self).persist_text(file_id, result)
    }
}

/// One input file in a batch.
#[derive(Debug, Clone)]
pub struct BatchFile {
    /// File name, used for classification and error reporting.
    pub name: String,

    /// Raw file content.
    pub data: Vec<u8>,
}

impl BatchFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Per-file or per-invoice failure recorded in the batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub file_name: String,
    pub reason: String,
}

/// Final report of one ingestion batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Invoices persisted.
    pub created: usize,

    /// Invoices skipped as duplicates of already-recorded ones.
    pub skipped_duplicate: usize,

    /// Invoices that reached reconciliation but could not be persisted.
    pub failed: usize,

    /// Per-file and per-invoice failures, in processing order.
    pub errors: Vec<BatchError>,

    /// Reason the batch stopped early, `None` when it ran to
    /// completion. Counts and errors recorded before the abort are
    /// preserved.
    pub aborted: Option<String>,
}
