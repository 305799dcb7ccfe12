//! Descriptor for the file currently loaded into the main panel.

use std::path::Path;

use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "mkv", "wmv", "flv", "m4v", "3gp", "webm", "ogv",
];
const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "doc", "rtf", "odt", "txt"];
const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Broad category of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FileType {
    /// Raster image, read by OCR directly.
    Image,
    /// Video; OCR runs on sampled frames.
    Video,
    /// Word processor or plain text document.
    Document,
    /// PDF; OCR runs per page.
    Pdf,
    /// Unrecognized extension (default).
    #[default]
    Unknown,
}

impl FileType {
    /// Classifies a path by its (case-insensitive) extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let Some(ext) = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
        else {
            return Self::Unknown;
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            Self::Document
        } else if PDF_EXTENSIONS.contains(&ext.as_str()) {
            Self::Pdf
        } else {
            Self::Unknown
        }
    }

    /// Whether the OCR pipeline can consume this type directly.
    #[must_use]
    pub fn is_ocr_source(self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Pdf)
    }
}

/// File descriptor supplied by the file backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileInfo {
    /// Full path or opaque handle.
    pub path: String,
    /// Display name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Lower-cased extension without the dot.
    pub extension: String,
    /// Broad category derived from the extension.
    pub file_type: FileType,
    /// Last modification time as reported by the backend.
    pub last_modified: String,
}

impl FileInfo {
    /// Builds a descriptor from a path and size, deriving name, extension
    /// and type.
    pub fn from_path(path: impl AsRef<Path>, size: u64) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path: path.to_string_lossy().into_owned(),
            name,
            size,
            extension,
            file_type: FileType::from_path(path),
            last_modified: String::new(),
        }
    }

    /// Human-readable size, e.g. `1.5 MB`.
    #[must_use]
    pub fn formatted_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// Formats a byte count with binary (1024) steps.
#[must_use]
pub fn format_file_size(size_bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if size_bytes == 0 {
        return "0 B".to_string();
    }

    let mut size_in_unit = size_bytes as f64;
    let mut unit_index = 0;
    while size_in_unit >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size_in_unit /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        return format!("{size_bytes} B");
    }

    format!("{size_in_unit:.1} {}", UNITS[unit_index])
}
