//! OCR Assistant State - shared UI state for the OCR & grammar assistant
//!
//! The desktop front end renders panels for file upload, OCR processing,
//! batch processing, export history and settings. All of them read slices
//! of one [`AppStore`] and write back through its setter actions. Only the
//! theme outlives the process, through a [`KeyValueStorage`] backend.

pub mod config;
pub mod error;
pub mod models;
pub mod state;

// Re-export key types for convenience
pub use {
    config::{JsonFileStorage, KeyValueStorage, MemoryStorage, SettingsError},
    error::{AppError, ErrorCode, ErrorReporter},
    models::{
        BatchProgress, ExportRecord, FileInfo, FileType, GrammarCheckResult, LanguageStats,
        OcrResult, PreprocessingOptions,
    },
    state::{AppSnapshot, AppStore, Projection, SelectorView, StateObserver, Theme, View},
};
