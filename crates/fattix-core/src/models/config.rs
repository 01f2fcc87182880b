//! Configuration structures for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the fattix pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FattixConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Batch ingestion configuration.
    pub ingest: IngestConfig,
}

/// OCR extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition language passed to the engine session.
    pub language: String,

    /// Page upscaling factor applied before recognition. Values below
    /// 2.0 are clamped up: recognition accuracy degrades at native
    /// resolution.
    pub render_scale: f32,

    /// Directory containing recognition model files.
    pub model_dir: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "ita".to_string(),
            render_scale: 2.0,
            model_dir: PathBuf::from("models"),
        }
    }
}

/// Batch ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory for the supplier/invoice store files.
    pub store_dir: PathBuf,

    /// Directory where OCR text exports are written.
    pub artifact_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("store"),
            artifact_dir: PathBuf::from("artifacts"),
        }
    }
}

impl FattixConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
