//! Field-subset projections of the application snapshot.
//!
//! Each panel reads one projection. A projection is only delivered when it
//! differs by value from the previous one, so panels re-render only when a
//! field they actually read changes. Setters for the projected fields live
//! on [`AppStore`].

use std::sync::Arc;

use {parking_lot::RwLock, tokio::sync::watch};

use crate::{
    models::{
        BatchProgress, ExportRecord, FileInfo, GrammarCheckResult, LanguageStats, OcrResult,
        PreprocessingOptions,
    },
    state::app_store::{AppSnapshot, AppStore, Theme, VersionedSnapshot, View},
};

/// A fixed subset of snapshot fields, compared by value.
pub trait Projection: Clone + PartialEq + Send + 'static {
    /// Extracts the subset from `snapshot`.
    fn project(snapshot: &AppSnapshot) -> Self;
}

/// File upload panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FileState {
    /// File selected for OCR.
    pub current_file: Option<FileInfo>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Projection for FileState {
    fn project(snapshot: &AppSnapshot) -> Self {
        Self {
            current_file: snapshot.current_file.clone(),
            is_loading: snapshot.is_loading,
            error: snapshot.error.clone(),
        }
    }
}

/// OCR processing panel.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrState {
    pub ocr_result: Option<OcrResult>,
    pub is_processing_ocr: bool,
    pub preprocessing_options: PreprocessingOptions,
}

impl Projection for OcrState {
    fn project(snapshot: &AppSnapshot) -> Self {
        Self {
            ocr_result: snapshot.ocr_result.clone(),
            is_processing_ocr: snapshot.is_processing_ocr,
            preprocessing_options: snapshot.preprocessing_options.clone(),
        }
    }
}

/// Grammar panel.
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarState {
    pub grammar_result: Option<GrammarCheckResult>,
    pub is_checking_grammar: bool,
    pub language_stats: Option<LanguageStats>,
}

impl Projection for GrammarState {
    fn project(snapshot: &AppSnapshot) -> Self {
        Self {
            grammar_result: snapshot.grammar_result.clone(),
            is_checking_grammar: snapshot.is_checking_grammar,
            language_stats: snapshot.language_stats,
        }
    }
}

/// Text editor.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub original_text: String,
    pub edited_text: String,
}

impl TextState {
    /// Whether the edit buffer differs from its baseline.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.original_text != self.edited_text
    }
}

impl Projection for TextState {
    fn project(snapshot: &AppSnapshot) -> Self {
        Self {
            original_text: snapshot.original_text.clone(),
            edited_text: snapshot.edited_text.clone(),
        }
    }
}

/// Export history panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportState {
    pub export_history: Vec<ExportRecord>,
    pub is_exporting: bool,
}

impl Projection for ExportState {
    fn project(snapshot: &AppSnapshot) -> Self {
        Self {
            export_history: snapshot.export_history.clone(),
            is_exporting: snapshot.is_exporting,
        }
    }
}

/// Window chrome: theme, navigation, error banner and batch status.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub theme: Theme,
    pub current_view: View,
    pub error: Option<String>,
    pub batch_progress: Option<BatchProgress>,
}

impl Projection for UiState {
    fn project(snapshot: &AppSnapshot) -> Self {
        Self {
            theme: snapshot.theme,
            current_view: snapshot.current_view,
            error: snapshot.error.clone(),
            batch_progress: snapshot.batch_progress.clone(),
        }
    }
}

impl AppStore {
    /// Projects the current snapshot onto `P`.
    #[must_use]
    pub fn select<P: Projection>(&self) -> P {
        P::project(&self.get())
    }

    /// Projection read by the file upload panel.
    #[must_use]
    pub fn file_state(&self) -> FileState {
        self.select()
    }

    #[must_use]
    pub fn ocr_state(&self) -> OcrState {
        self.select()
    }

    #[must_use]
    pub fn grammar_state(&self) -> GrammarState {
        self.select()
    }

    #[must_use]
    pub fn text_state(&self) -> TextState {
        self.select()
    }

    #[must_use]
    pub fn export_state(&self) -> ExportState {
        self.select()
    }

    /// Projection read by the window chrome.
    #[must_use]
    pub fn ui_state(&self) -> UiState {
        self.select()
    }

    /// Opens a change-filtered view of projection `P`.
    pub fn view<P: Projection>(&self) -> SelectorView<P> {
        SelectorView::new(self)
    }
}

/// Async stream of changes to one projection.
///
/// Listens to the store's version signal and projects the newest snapshot
/// when it moves, so an idle view holds no queued snapshots. Intermediate
/// snapshots between two reads are skipped, as are snapshots that project
/// to an equal value.
#[derive(Debug)]
pub struct SelectorView<P> {
    versions: watch::Receiver<u64>,
    snapshot: Arc<RwLock<VersionedSnapshot>>,
    last: P,
}

impl<P: Projection> SelectorView<P> {
    /// Attaches to `store`, using its current projection as the baseline.
    pub fn new(store: &AppStore) -> Self {
        // Listen first so no write between the two calls is lost.
        let versions = store.version_receiver();
        let last = store.select();
        Self {
            versions,
            snapshot: store.snapshot_cell(),
            last,
        }
    }

    /// The last projection seen.
    pub fn current(&self) -> &P {
        &self.last
    }

    /// Waits for the next write whose projection differs.
    ///
    /// Returns `None` once every handle to the store has been dropped.
    pub async fn changed(&mut self) -> Option<P> {
        while self.versions.changed().await.is_ok() {
            if let Some(next) = self.accept() {
                return Some(next);
            }
        }
        None
    }

    /// Checks for a change without blocking.
    ///
    /// Returns the newest projection if it differs from the one seen before
    /// the call, otherwise `None`.
    pub fn try_changed(&mut self) -> Option<P> {
        match self.versions.has_changed() {
            Ok(true) => self.accept(),
            _ => None,
        }
    }

    fn accept(&mut self) -> Option<P> {
        // Mark seen before reading, so a later write wakes the next wait.
        let _ = self.versions.borrow_and_update();
        let snapshot = Arc::clone(&self.snapshot.read().snapshot);
        let next = P::project(&snapshot);
        if next == self.last {
            return None;
        }
        self.last = next.clone();
        Some(next)
    }
}
