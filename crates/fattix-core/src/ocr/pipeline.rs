//! Per-document OCR extraction: rasterize each page, recognize, collect.

use lopdf::Document;
use tracing::{debug, info};

use super::{
    MIN_RENDER_SCALE, OcrPage, OcrResult, PageRasterizer, PageRecognition, PdfTextSource,
    RecognitionEngine, RecognitionSession,
};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// OCR extraction pipeline over a rasterizer and a recognition engine.
pub struct TextExtractor<R, E> {
    rasterizer: R,
    engine: E,
    config: OcrConfig,
}

impl<R, E> TextExtractor<R, E>
where
    R: PageRasterizer,
    E: RecognitionEngine,
{
    /// Create a pipeline with default configuration.
    pub fn new(rasterizer: R, engine: E) -> Self {
        Self {
            rasterizer,
            engine,
            config: OcrConfig::default(),
        }
    }

    /// Set configuration.
    pub fn with_config(mut self, config: OcrConfig) -> Self {
        self.config = config;
        self
    }

    /// Extract recognized text from every page of a PDF, in page order.
    ///
    /// A failure on any page aborts extraction for the whole document;
    /// per-document isolation is the caller's job. The recognition
    /// session is opened once per document and released before this
    /// function returns, on the error paths included.
    pub fn extract(&self, pdf: &[u8]) -> Result<OcrResult, OcrError> {
        let document =
            Document::load_mem(pdf).map_err(|e| OcrError::DocumentLoad(e.to_string()))?;
        let page_count = document.get_pages().len() as u32;
        if page_count == 0 {
            return Err(OcrError::NoPages);
        }

        let scale = self.config.render_scale.max(MIN_RENDER_SCALE);
        debug!(pages = page_count, scale, "starting OCR extraction");

        let mut session = self.engine.open(&self.config.language)?;

        let mut pages = Vec::with_capacity(page_count as usize);
        for page_number in 1..=page_count {
            let image = self.rasterizer.render(pdf, page_number, scale)?;
            let recognition = session.recognize(&image)?;
            let lines = page_lines(&recognition);
            debug!(
                page = page_number,
                lines = lines.len(),
                confidence = recognition.confidence,
                "page recognized"
            );
            pages.push(OcrPage {
                page_number,
                text: recognition.text.trim().to_string(),
                lines,
                confidence: recognition.confidence,
            });
        }

        info!(pages = pages.len(), "OCR extraction complete");
        Ok(OcrResult { pages })
    }
}

impl<R, E> PdfTextSource for TextExtractor<R, E>
where
    R: PageRasterizer,
    E: RecognitionEngine,
{
    fn extract(&self, pdf: &[u8]) -> Result<OcrResult, OcrError> {
        TextExtractor::extract(self, pdf)
    }
}

/// Flatten structured paragraph data into reading-order lines, falling
/// back to splitting the raw text when the engine returned none.
fn page_lines(recognition: &PageRecognition) -> Vec<String> {
    if recognition.paragraphs.is_empty() {
        recognition
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    } else {
        recognition
            .paragraphs
            .iter()
            .flat_map(|p| p.lines.iter())
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ocr::Paragraph;
    use crate::ocr::testutil::pdf_with_pages;

    /// Rasterizer stub recording the scale of every render call.
    struct StubRasterizer {
        scales: Rc<RefCell<Vec<f32>>>,
    }

    impl StubRasterizer {
        fn new() -> Self {
            Self {
                scales: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl PageRasterizer for StubRasterizer {
        fn render(&self, _pdf: &[u8], _page: u32, scale: f32) -> Result<DynamicImage, OcrError> {
            self.scales.borrow_mut().push(scale);
            Ok(DynamicImage::new_rgb8(4, 4))
        }
    }

    /// Engine whose sessions replay scripted per-page results (`None`
    /// marks a recognition failure) and flag their own release.
    struct ScriptedEngine {
        script: Vec<Option<PageRecognition>>,
        released: Rc<RefCell<bool>>,
    }

    impl ScriptedEngine {
        fn new(script: Vec<Option<PageRecognition>>) -> Self {
            Self {
                script,
                released: Rc::new(RefCell::new(false)),
            }
        }
    }

    struct ScriptedSession {
        script: Vec<Option<PageRecognition>>,
        next: usize,
        released: Rc<RefCell<bool>>,
    }

    impl RecognitionEngine for ScriptedEngine {
        type Session = ScriptedSession;

        fn open(&self, _language: &str) -> Result<ScriptedSession, OcrError> {
            Ok(ScriptedSession {
                script: self.script.clone(),
                next: 0,
                released: Rc::clone(&self.released),
            })
        }
    }

    impl RecognitionSession for ScriptedSession {
        fn recognize(&mut self, _image: &DynamicImage) -> Result<PageRecognition, OcrError> {
            let result = self.script[self.next].clone();
            self.next += 1;
            result.ok_or_else(|| OcrError::Recognition("garbled page".to_string()))
        }
    }

    impl Drop for ScriptedSession {
        fn drop(&mut self) {
            *self.released.borrow_mut() = true;
        }
    }

    fn flat_page(text: &str, confidence: f32) -> Option<PageRecognition> {
        Some(PageRecognition {
            text: text.to_string(),
            confidence,
            paragraphs: Vec::new(),
        })
    }

    #[test]
    fn extracts_one_result_per_page_in_order() {
        let pdf = pdf_with_pages(3);
        let engine = ScriptedEngine::new(vec![
            flat_page("page one", 91.0),
            flat_page("page two", 88.5),
            flat_page("page three", 79.0),
        ]);
        let extractor = TextExtractor::new(StubRasterizer::new(), engine);

        let result = extractor.extract(&pdf).unwrap();

        assert_eq!(result.pages.len(), 3);
        let numbers: Vec<u32> = result.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(result.pages[1].text, "page two");
        assert_eq!(result.pages[1].confidence, 88.5);
    }

    #[test]
    fn clamps_render_scale_to_minimum() {
        let pdf = pdf_with_pages(2);
        let rasterizer = StubRasterizer::new();
        let scales = Rc::clone(&rasterizer.scales);
        let engine = ScriptedEngine::new(vec![flat_page("a", 90.0), flat_page("b", 90.0)]);
        let config = OcrConfig {
            render_scale: 1.0,
            ..OcrConfig::default()
        };
        let extractor = TextExtractor::new(rasterizer, engine).with_config(config);

        extractor.extract(&pdf).unwrap();

        assert_eq!(*scales.borrow(), vec![2.0, 2.0]);
    }

    #[test]
    fn flattens_paragraphs_into_lines() {
        let pdf = pdf_with_pages(1);
        let recognition = PageRecognition {
            text: "Fattura n. 12\nTotale 100,00".to_string(),
            confidence: 85.0,
            paragraphs: vec![
                Paragraph {
                    lines: vec!["Fattura n. 12".to_string(), "  ".to_string()],
                },
                Paragraph {
                    lines: vec![" Totale 100,00 ".to_string()],
                },
            ],
        };
        let engine = ScriptedEngine::new(vec![Some(recognition)]);
        let extractor = TextExtractor::new(StubRasterizer::new(), engine);

        let result = extractor.extract(&pdf).unwrap();

        assert_eq!(
            result.pages[0].lines,
            vec!["Fattura n. 12".to_string(), "Totale 100,00".to_string()]
        );
    }

    #[test]
    fn falls_back_to_splitting_raw_text() {
        let pdf = pdf_with_pages(1);
        let engine = ScriptedEngine::new(vec![flat_page(" alpha \n\n beta \n", 70.0)]);
        let extractor = TextExtractor::new(StubRasterizer::new(), engine);

        let result = extractor.extract(&pdf).unwrap();

        assert_eq!(
            result.pages[0].lines,
            vec!["alpha".to_string(), "beta".to_string()]
        );
        assert_eq!(result.pages[0].text, "alpha \n\n beta");
    }

    #[test]
    fn page_failure_aborts_document_and_releases_session() {
        let pdf = pdf_with_pages(2);
        let engine = ScriptedEngine::new(vec![flat_page("ok", 90.0), None]);
        let released = Rc::clone(&engine.released);
        let extractor = TextExtractor::new(StubRasterizer::new(), engine);

        let err = extractor.extract(&pdf).unwrap_err();

        assert!(matches!(err, OcrError::Recognition(_)));
        assert!(*released.borrow(), "session must be released on failure");
    }

    #[test]
    fn rejects_bytes_that_are_not_a_pdf() {
        let engine = ScriptedEngine::new(vec![]);
        let extractor = TextExtractor::new(StubRasterizer::new(), engine);

        let err = extractor.extract(b"not a pdf").unwrap_err();
        assert!(matches!(err, OcrError::DocumentLoad(_)));
    }
}
