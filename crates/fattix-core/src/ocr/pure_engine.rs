//! Recognition engine backed by `pure-onnx-ocr` (pure Rust, no external
//! ONNX Runtime).

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info};

use super::{PageRecognition, Paragraph, RecognitionEngine, RecognitionSession};
use crate::error::OcrError;

/// Recognition engine loading `pure-onnx-ocr` models from a directory.
///
/// Model files follow the standard layout: `det.onnx`, `latin_rec.onnx`
/// and `latin_dict.txt`. The dictionary covers latin scripts, so the
/// session language is informational only.
pub struct PureOcrEngine {
    model_dir: PathBuf,
}

impl PureOcrEngine {
    /// Create an engine reading models from `model_dir`.
    pub fn from_dir(model_dir: &Path) -> Self {
        Self {
            model_dir: model_dir.to_path_buf(),
        }
    }
}

impl RecognitionEngine for PureOcrEngine {
    type Session = PureOcrSession;

    fn open(&self, language: &str) -> Result<PureOcrSession, OcrError> {
        let det_path = self.model_dir.join("det.onnx");
        let rec_path = self.model_dir.join("latin_rec.onnx");
        let dict_path = self.model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::EngineInit(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            language,
            model_dir = %self.model_dir.display(),
            "opened recognition session"
        );

        Ok(PureOcrSession { engine })
    }
}

/// An open `pure-onnx-ocr` session. Model state is released on drop.
pub struct PureOcrSession {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

impl RecognitionSession for PureOcrSession {
    fn recognize(&mut self, image: &DynamicImage) -> Result<PageRecognition, OcrError> {
        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("recognition returned {} text regions", results.len());

        if results.is_empty() {
            return Ok(PageRecognition::default());
        }

        let mut regions: Vec<Region> = results
            .iter()
            .map(|r| {
                let (x, y) = region_origin(&r.bounding_box);
                Region {
                    x,
                    y,
                    text: r.text.clone(),
                    confidence: r.confidence,
                }
            })
            .collect();

        // Reading order: bucket by approximate row, then left to right.
        regions.sort_by(|a, b| {
            let row_a = (a.y / 20.0) as i32;
            let row_b = (b.y / 20.0) as i32;
            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal)
            }
        });

        let mut lines: Vec<String> = Vec::new();
        let mut current_row = i32::MIN;
        for region in &regions {
            let row = (region.y / 20.0) as i32;
            if row != current_row || lines.is_empty() {
                lines.push(region.text.clone());
                current_row = row;
            } else if let Some(last) = lines.last_mut() {
                last.push(' ');
                last.push_str(&region.text);
            }
        }

        let confidence =
            regions.iter().map(|r| r.confidence).sum::<f32>() / regions.len() as f32 * 100.0;
        let text = lines.join("\n");

        Ok(PageRecognition {
            text,
            confidence,
            paragraphs: vec![Paragraph { lines }],
        })
    }
}

struct Region {
    x: f32,
    y: f32,
    text: String,
    confidence: f32,
}

/// First exterior point of the region polygon.
fn region_origin(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .next()
        .map(|c| (c.x as f32, c.y as f32))
        .unwrap_or((0.0, 0.0))
}
