//! Error types for the fattix-core library.

use thiserror::Error;

/// Main error type for the fattix library.
#[derive(Error, Debug)]
pub enum FattixError {
    /// Electronic-invoice XML error.
    #[error("XML invoice error: {0}")]
    Xml(#[from] XmlError),

    /// OCR extraction error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Batch ingestion error.
    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by the electronic-invoice parser.
#[derive(Error, Debug)]
pub enum XmlError {
    /// The input could not be parsed as e-invoice XML.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The mandatory supplier element is absent.
    #[error("missing supplier element")]
    MissingSupplier,
}

/// Errors raised by the OCR extraction pipeline.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The byte stream could not be opened as a PDF.
    #[error("failed to open PDF: {0}")]
    DocumentLoad(String),

    /// The PDF is empty.
    #[error("PDF has no pages")]
    NoPages,

    /// A page outside the document was requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The recognition engine could not be initialized.
    #[error("failed to initialize recognition engine: {0}")]
    EngineInit(String),

    /// Page rasterization failed.
    #[error("page rendering failed: {0}")]
    Raster(String),

    /// Text recognition failed on a page.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors raised while reconciling and persisting a batch.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A supplier could not be resolved or created.
    #[error("supplier resolution failed: {0}")]
    SupplierResolution(String),

    /// The invoice repository rejected a persistence request.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// The backing repository is unreachable.
    #[error("repository unavailable: {0}")]
    Repository(String),

    /// An OCR text export could not be written.
    #[error("artifact export failed: {0}")]
    Artifact(String),
}

/// Result type for the fattix library.
pub type Result<T> = std::result::Result<T, FattixError>;
