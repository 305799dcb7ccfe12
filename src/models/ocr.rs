//! OCR backend records.

use serde::{Deserialize, Serialize};

/// Pixel rectangle of a recognized word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A single recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordDetail {
    pub text: String,
    /// Recognition confidence in `0.0..=1.0`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Result of one OCR run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OcrResult {
    /// Full recognized text.
    pub text: String,
    /// Mean recognition confidence in `0.0..=1.0`.
    pub confidence: f32,
    /// Engine identifier, e.g. `"tesseract"`.
    pub engine_used: String,
    /// Wall time in seconds.
    pub processing_time: f64,
    /// Per-word breakdown, empty when the engine does not report it.
    #[serde(default)]
    pub word_details: Vec<WordDetail>,
}

impl OcrResult {
    /// Confidence as a whole percentage for display.
    #[must_use]
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    /// Words recognized below `threshold` confidence.
    pub fn low_confidence_words(&self, threshold: f32) -> impl Iterator<Item = &WordDetail> {
        self.word_details
            .iter()
            .filter(move |word| word.confidence < threshold)
    }
}

/// Image preprocessing choices applied before OCR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessingOptions {
    pub enhance_contrast: bool,
    pub denoise: bool,
    /// Thresholding method name understood by the backend.
    pub threshold_method: String,
    pub apply_morphology: bool,
}

impl Default for PreprocessingOptions {
    fn default() -> Self {
        Self {
            enhance_contrast: true,
            denoise: true,
            threshold_method: "adaptive_gaussian".to_string(),
            apply_morphology: true,
        }
    }
}
