//! OCR text extraction for scanned PDF invoices.
//!
//! The page rasterizer and the recognition engine are external
//! capabilities consumed through the traits below; the pipeline itself
//! only sequences pages and shapes the output.

mod pipeline;
#[cfg(feature = "native")]
mod pure_engine;
mod raster;

pub use pipeline::TextExtractor;
#[cfg(feature = "native")]
pub use pure_engine::{PureOcrEngine, PureOcrSession};
pub use raster::EmbeddedImageRasterizer;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Minimum page upscaling factor. Recognition accuracy degrades below
/// 2x the PDF's native resolution.
pub const MIN_RENDER_SCALE: f32 = 2.0;

/// Recognized text for a single PDF page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    /// Page number, 1-based, in document order.
    pub page_number: u32,

    /// Full recognized text, trimmed.
    pub text: String,

    /// Non-empty trimmed text lines in reading order.
    pub lines: Vec<String>,

    /// Engine confidence on a 0-100 scale.
    pub confidence: f32,
}

/// OCR output for a whole document: one entry per page, in page order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    pub pages: Vec<OcrPage>,
}

impl OcrResult {
    /// Plain-text export of the whole document, pages separated by a
    /// blank line.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Mean page confidence, zero for an empty document.
    pub fn mean_confidence(&self) -> f32 {
        if self.pages.is_empty() {
            return 0.0;
        }
        self.pages.iter().map(|p| p.confidence).sum::<f32>() / self.pages.len() as f32
    }
}

/// Raw engine output for one rendered page.
#[derive(Debug, Clone, Default)]
pub struct PageRecognition {
    /// Full recognized text.
    pub text: String,

    /// Confidence on a 0-100 scale.
    pub confidence: f32,

    /// Structured paragraph/line data, empty when the engine returns
    /// flat text only.
    pub paragraphs: Vec<Paragraph>,
}

/// A recognized paragraph.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub lines: Vec<String>,
}

/// Renders one PDF page to a raster image. Deterministic for fixed
/// inputs.
pub trait PageRasterizer {
    /// Render `page_number` (1-based) of the given PDF at `scale` times
    /// its native resolution.
    fn render(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<DynamicImage, OcrError>;
}

/// A text-recognition engine. Opening a session is expensive; the
/// pipeline opens one per document and reuses it across pages.
pub trait RecognitionEngine {
    type Session: RecognitionSession;

    fn open(&self, language: &str) -> Result<Self::Session, OcrError>;
}

/// An open recognition session. Engine resources are released when the
/// session is dropped, which also covers the page-failure path.
pub trait RecognitionSession {
    fn recognize(&mut self, image: &DynamicImage) -> Result<PageRecognition, OcrError>;
}

/// A capability that turns PDF bytes into recognized text. Implemented
/// by [`TextExtractor`]; the batch orchestrator depends on this seam
/// rather than on a concrete pipeline.
pub trait PdfTextSource {
    fn extract(&self, pdf: &[u8]) -> Result<OcrResult, OcrError>;
}
