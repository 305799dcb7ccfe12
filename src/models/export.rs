//! Export history records.

use {
    chrono::{SecondsFormat, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

use crate::models::{grammar::GrammarCheckResult, ocr::OcrResult};

/// Number of grammar messages kept in `error_summary`.
const SUMMARY_LIMIT: usize = 3;

/// Description of one completed export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Unique record ID.
    pub id: String,
    /// RFC 3339 UTC time the export finished.
    pub timestamp: String,
    pub original_text: String,
    pub corrected_text: String,
    pub grammar_error_count: usize,
    pub ocr_engine: String,
    pub ocr_confidence: f32,
    /// Combined OCR and grammar processing time in seconds.
    pub processing_time: f64,
    /// Kind of source, e.g. `"image"` or `"batch"`.
    pub source_type: String,
    pub error_summary: String,
}

impl ExportRecord {
    /// Creates an empty record with a fresh ID and the current timestamp.
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            original_text: String::new(),
            corrected_text: String::new(),
            grammar_error_count: 0,
            ocr_engine: String::new(),
            ocr_confidence: 0.0,
            processing_time: 0.0,
            source_type: source_type.into(),
            error_summary: String::new(),
        }
    }

    /// Builds a record from an OCR run and an optional grammar check.
    ///
    /// Without a grammar result the corrected text equals the OCR text.
    pub fn from_results(
        ocr: &OcrResult,
        grammar: Option<&GrammarCheckResult>,
        source_type: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(source_type);
        record.original_text = ocr.text.clone();
        record.ocr_engine = ocr.engine_used.clone();
        record.ocr_confidence = ocr.confidence;
        record.processing_time = ocr.processing_time;

        match grammar {
            Some(grammar) => {
                record.corrected_text = grammar.corrected_text.clone();
                record.grammar_error_count = grammar.error_count;
                record.processing_time += grammar.processing_time;
                record.error_summary = grammar.summary(SUMMARY_LIMIT);
            }
            None => record.corrected_text = ocr.text.clone(),
        }

        record
    }
}
