//! Collaborator error taxonomy using `thiserror`.
//!
//! The OCR, grammar, file and export collaborators report failures as
//! [`AppError`]. The state store only keeps the rendered message; the code
//! and details stay available to whoever logs the error.

use std::io::{Error as IoError, ErrorKind};

use {
    anyhow::Error as AnyhowError,
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

/// Failure category reported by a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The OCR engine failed to start.
    OcrInitialization,
    /// The OCR engine failed on an input.
    OcrProcessing,
    /// An image could not be decoded.
    ImageLoading,
    /// Preprocessing before OCR failed.
    ImagePreprocessing,
    /// The grammar service returned an error.
    GrammarService,
    /// The LanguageTool server could not be reached.
    LanguageToolConnection,
    /// A grammar response could not be processed.
    GrammarProcessing,
    /// A file does not exist.
    FileNotFound,
    /// A file exists but could not be read or written.
    FileAccess,
    /// A file is not in the expected format.
    InvalidFileFormat,
    /// A file failed size or content checks.
    FileValidation,
    /// Writing a CSV export failed.
    CsvExport,
    /// Reading a CSV file failed.
    CsvImport,
    /// A record failed validation.
    DataValidation,
    /// A batch job failed.
    BatchProcessing,
    /// A batch job was cancelled.
    BatchCancellation,
    /// A caller passed an invalid argument.
    InvalidInput,
    /// A backend service is down.
    ServiceUnavailable,
    /// Any failure without a more specific code.
    InternalError,
}

/// Error reported by an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{}", render(.message, .details))]
pub struct AppError {
    /// Failure category.
    pub code: ErrorCode,
    /// Short human-readable message.
    pub message: String,
    /// Optional underlying cause.
    pub details: Option<String>,
}

fn render(message: &str, details: &Option<String>) -> String {
    match details {
        Some(details) => format!("{message}: {details}"),
        None => message.to_string(),
    }
}

impl AppError {
    /// Creates an error without details.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an error carrying additional details.
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// A file that does not exist.
    pub fn file_not_found(path: &str) -> Self {
        Self::new(ErrorCode::FileNotFound, format!("File not found: {path}"))
    }

    /// A file whose format is not the expected one.
    pub fn invalid_file_format(path: &str, expected: &str) -> Self {
        Self::with_details(
            ErrorCode::InvalidFileFormat,
            format!("Invalid file format for: {path}"),
            format!("Expected: {expected}"),
        )
    }

    /// A backend service that could not be reached.
    pub fn service_unavailable(service: &str) -> Self {
        Self::new(
            ErrorCode::ServiceUnavailable,
            format!("{service} service is currently unavailable"),
        )
    }

    /// A field that failed validation.
    pub fn validation_failed(field: &str, reason: &str) -> Self {
        Self::with_details(
            ErrorCode::DataValidation,
            format!("Validation failed for {field}"),
            reason,
        )
    }
}

impl From<IoError> for AppError {
    fn from(err: IoError) -> Self {
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::FileNotFound,
            ErrorKind::PermissionDenied => ErrorCode::FileAccess,
            _ => ErrorCode::InternalError,
        };
        Self::new(code, err.to_string())
    }
}

impl From<AnyhowError> for AppError {
    fn from(err: AnyhowError) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}
