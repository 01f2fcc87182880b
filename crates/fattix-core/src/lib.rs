//! Core library for supplier-invoice ingestion.
//!
//! This crate provides:
//! - Electronic-invoice XML parsing into structured invoice records
//! - OCR text extraction for scanned PDF invoices
//! - Batch ingestion with deduplication, supplier resolution and
//!   persistence through external repositories

pub mod error;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod xml;

pub use error::{FattixError, IngestError, OcrError, Result, XmlError};
pub use ingest::{
    ArtifactSink, BatchError, BatchFile, BatchIngestor, BatchReport, DiscardArtifacts,
    InvoiceRecord, InvoiceRepository, SupplierId, SupplierRepository,
};
pub use models::config::{FattixConfig, IngestConfig, OcrConfig};
pub use models::invoice::{InvoiceLine, ParsedInvoice, SupplierCandidate};
pub use xml::parse_invoice;
pub use ocr::{
    EmbeddedImageRasterizer, OcrPage, OcrResult, PageRasterizer, PageRecognition, Paragraph,
    PdfTextSource, RecognitionEngine, RecognitionSession, TextExtractor,
};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
