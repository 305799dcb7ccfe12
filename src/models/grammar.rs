//! Grammar-check backend records.

use serde::{Deserialize, Serialize};

/// Average reading speed used for `reading_time_minutes`.
const WORDS_PER_MINUTE: f64 = 200.0;

/// Kind of issue a grammar rule flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    /// Misspelled or unknown word.
    Spelling,
    /// Agreement, tense or other grammar rule.
    Grammar,
    /// Missing or misplaced punctuation.
    Punctuation,
    /// Stylistic suggestion.
    Style,
    /// Repeated or superfluous words.
    Redundancy,
    /// Ambiguous or hard-to-read phrasing.
    Clarity,
    /// Any rule category not listed above.
    Other,
}

/// One issue found in the checked text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarError {
    pub message: String,
    pub rule_id: String,
    pub category: String,
    /// Byte offset into the checked text.
    pub offset: usize,
    /// Byte length of the flagged span.
    pub length: usize,
    /// Surrounding text for display.
    pub context: String,
    pub suggestions: Vec<String>,
    pub severity: String,
    pub confidence: f32,
    pub error_type: ErrorType,
}

/// Result of one grammar check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GrammarCheckResult {
    pub original_text: String,
    pub corrected_text: String,
    pub errors: Vec<GrammarError>,
    /// Wall time in seconds.
    pub processing_time: f64,
    pub error_count: usize,
}

impl GrammarCheckResult {
    /// Number of issues of the given kind.
    #[must_use]
    pub fn count_of(&self, error_type: ErrorType) -> usize {
        self.errors
            .iter()
            .filter(|e| e.error_type == error_type)
            .count()
    }

    /// Messages of the first `limit` issues joined by `"; "`.
    #[must_use]
    pub fn summary(&self, limit: usize) -> String {
        self.errors
            .iter()
            .take(limit)
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Simple statistics over a block of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LanguageStats {
    pub words: usize,
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub reading_time_minutes: usize,
}

impl LanguageStats {
    /// Computes statistics for `text`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let words = text.split_whitespace().count();

        Self {
            words,
            characters: text.chars().count(),
            characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
            sentences: text
                .split(['.', '!', '?'])
                .filter(|s| !s.trim().is_empty())
                .count(),
            paragraphs: text
                .split("\n\n")
                .filter(|p| !p.trim().is_empty())
                .count(),
            reading_time_minutes: (words as f64 / WORDS_PER_MINUTE).ceil() as usize,
        }
    }
}
