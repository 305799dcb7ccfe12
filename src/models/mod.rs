//! Records exchanged with the OCR, grammar, file and export collaborators.
//!
//! The state store keeps these as opaque values; the helpers here exist for
//! the panels that render them.

pub mod batch;
pub mod export;
pub mod file;
pub mod grammar;
pub mod ocr;

pub use {
    batch::BatchProgress,
    export::ExportRecord,
    file::{FileInfo, FileType, format_file_size},
    grammar::{ErrorType, GrammarCheckResult, GrammarError, LanguageStats},
    ocr::{BoundingBox, OcrResult, PreprocessingOptions, WordDetail},
};
