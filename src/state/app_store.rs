//! Global application state with reactive update mechanisms.
//!
//! This module provides the central `AppStore` container that holds the
//! shared UI snapshot, applies setter actions to it and fans every new
//! snapshot out to observers and channel subscribers.

use std::{
    cell::RefCell,
    fmt::{Debug, Formatter, Result as FmtResult},
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use {
    anyhow::Error as AnyhowError,
    async_channel::{Receiver, Sender, unbounded},
    parking_lot::{ReentrantMutex, RwLock},
    serde::{Deserialize, Serialize},
    tokio::sync::watch,
    tracing::{debug, warn},
};

use crate::{
    config::{KeyValueStorage, SettingsError},
    error::{AppError, ErrorReporter},
    models::{
        BatchProgress, ExportRecord, FileInfo, GrammarCheckResult, LanguageStats, OcrResult,
        PreprocessingOptions,
    },
};

/// Storage key the theme is persisted under.
pub const THEME_KEY: &str = "theme";

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light colour scheme.
    Light,
    /// Dark colour scheme.
    Dark,
    /// Follow the desktop setting (default).
    #[default]
    System,
}

impl Theme {
    /// Stored string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl FromStr for Theme {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(SettingsError::InvalidValue {
                reason: format!("unknown theme '{other}'"),
            }),
        }
    }
}

/// Panel currently shown in the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Single-file OCR and grammar panel (default).
    #[default]
    Main,
    /// Multi-file batch processing panel.
    Batch,
    /// Export history panel.
    History,
}

/// Complete value of the UI state at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppSnapshot {
    /// Colour scheme; the only persisted field.
    pub theme: Theme,
    pub current_view: View,
    /// File selected for OCR.
    pub current_file: Option<FileInfo>,
    pub ocr_result: Option<OcrResult>,
    pub grammar_result: Option<GrammarCheckResult>,
    /// Pristine text the edit buffer started from.
    pub original_text: String,
    /// User-editable text buffer.
    pub edited_text: String,
    /// Completed exports, newest first.
    pub export_history: Vec<ExportRecord>,
    /// Last surfaced error message.
    pub error: Option<String>,
    /// A file is being loaded.
    pub is_loading: bool,
    pub is_processing_ocr: bool,
    pub is_checking_grammar: bool,
    pub is_exporting: bool,
    pub preprocessing_options: PreprocessingOptions,
    pub language_stats: Option<LanguageStats>,
    pub batch_progress: Option<BatchProgress>,
}

impl AppSnapshot {
    /// Whether the edit buffer differs from its baseline.
    #[must_use]
    pub fn is_text_modified(&self) -> bool {
        self.edited_text != self.original_text
    }

    /// Most recent export, if any.
    #[must_use]
    pub fn latest_export(&self) -> Option<&ExportRecord> {
        self.export_history.first()
    }
}

/// Handle returned by [`AppStore::add_observer`] and [`AppStore::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Trait for UI components to react to state changes.
///
/// Observers run synchronously on the writing thread after the store's
/// lock has been released, so they may read the store again. When several
/// threads write at once, observers on different threads can see their
/// snapshots in either order.
pub trait StateObserver: Send + Sync {
    /// Handles a new snapshot.
    fn on_state_changed(&self, snapshot: &AppSnapshot);

    /// Handles snapshot number `version`.
    ///
    /// Versions increase by one per action, in the order actions were
    /// applied. Observers that must settle on the newest state override
    /// this to drop versions older than one already seen.
    fn on_state_version(&self, version: u64, snapshot: &AppSnapshot) {
        let _ = version;
        self.on_state_changed(snapshot);
    }
}

impl<F> StateObserver for F
where
    F: Fn(&AppSnapshot) + Send + Sync,
{
    fn on_state_changed(&self, snapshot: &AppSnapshot) {
        self(snapshot);
    }
}

/// Last version and projected value handed to a watch callback.
struct Delivered<T> {
    version: u64,
    value: T,
}

/// Observer that forwards only changes of a projected value.
///
/// The lock is held while the callback runs so callbacks never overtake
/// each other. It is reentrant, so a callback may write to the store.
struct SelectorObserver<T, S, F> {
    selector: S,
    callback: F,
    last: ReentrantMutex<RefCell<Delivered<T>>>,
}

impl<T, S, F> SelectorObserver<T, S, F>
where
    T: Clone + PartialEq + Send,
    S: Fn(&AppSnapshot) -> T + Send + Sync,
    F: Fn(&T) + Send + Sync,
{
    fn deliver(&self, version: Option<u64>, snapshot: &AppSnapshot) {
        let guard = self.last.lock();
        let next = {
            let mut last = guard.borrow_mut();
            if let Some(version) = version {
                if version <= last.version {
                    return;
                }
                last.version = version;
            }
            let next = (self.selector)(snapshot);
            if last.value == next {
                return;
            }
            last.value = next.clone();
            next
        };
        (self.callback)(&next);
    }
}

impl<T, S, F> StateObserver for SelectorObserver<T, S, F>
where
    T: Clone + PartialEq + Send,
    S: Fn(&AppSnapshot) -> T + Send + Sync,
    F: Fn(&T) + Send + Sync,
{
    fn on_state_changed(&self, snapshot: &AppSnapshot) {
        self.deliver(None, snapshot);
    }

    fn on_state_version(&self, version: u64, snapshot: &AppSnapshot) {
        self.deliver(Some(version), snapshot);
    }
}

type ObserverList = Vec<(SubscriptionId, Arc<dyn StateObserver>)>;

/// Current snapshot and the number of actions applied so far.
#[derive(Debug)]
pub(crate) struct VersionedSnapshot {
    pub(crate) version: u64,
    pub(crate) snapshot: Arc<AppSnapshot>,
}

/// Central state container with thread-safe access.
///
/// Cloning is cheap and every clone shares the same state; the application
/// root creates one store and hands clones to each view.
#[derive(Clone)]
pub struct AppStore {
    /// Current snapshot. Replaced copy-on-write by every action.
    snapshot: Arc<RwLock<VersionedSnapshot>>,
    /// Latest version, for selector views. Closes when the last store
    /// handle is dropped.
    versions: Arc<watch::Sender<u64>>,
    /// Backend the theme is persisted to.
    storage: Arc<dyn KeyValueStorage>,
    /// Synchronous observers in registration order.
    observers: Arc<RwLock<ObserverList>>,
    /// Channel subscribers for manual broadcast fan-out.
    subscribers: Arc<RwLock<Vec<Sender<Arc<AppSnapshot>>>>>,
    next_id: Arc<AtomicU64>,
}

impl Debug for AppStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let current = self.snapshot.read();
        f.debug_struct("AppStore")
            .field("version", &current.version)
            .field("snapshot", &current.snapshot)
            .field("storage", &self.storage)
            .field("observers", &self.observers.read().len())
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

impl AppStore {
    /// Creates the store with static defaults and the persisted theme.
    ///
    /// # Arguments
    ///
    /// * `storage` - Persistent storage the `theme` key is read from and
    ///   written to.
    ///
    /// # Returns
    ///
    /// A new `AppStore`. A missing or unrecognised stored theme falls back
    /// to [`Theme::System`].
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let theme = storage
            .get(THEME_KEY)
            .and_then(|raw| match raw.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    warn!("AppStore: ignoring stored theme: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        debug!("AppStore: initial theme {:?}", theme);

        let (versions, _) = watch::channel(0);
        Self {
            snapshot: Arc::new(RwLock::new(VersionedSnapshot {
                version: 0,
                snapshot: Arc::new(AppSnapshot {
                    theme,
                    ..AppSnapshot::default()
                }),
            })),
            versions: Arc::new(versions),
            storage,
            observers: Arc::new(RwLock::new(Vec::new())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns the current immutable snapshot.
    #[must_use]
    pub fn get(&self) -> Arc<AppSnapshot> {
        Arc::clone(&self.snapshot.read().snapshot)
    }

    /// Number of actions applied since the store was created.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.snapshot.read().version
    }

    /// Applies `f` to the snapshot and notifies once.
    ///
    /// Use this to write several fields as one change.
    pub fn update(&self, f: impl FnOnce(&mut AppSnapshot)) {
        self.apply("update", f);
    }

    /// Writes one action and publishes the result.
    ///
    /// Channel subscribers and the version signal are fed under the write
    /// lock, so they see snapshots in write order. Observers run after the
    /// lock is released and receive the version with the snapshot.
    fn apply(&self, action: &'static str, f: impl FnOnce(&mut AppSnapshot)) {
        debug!(action, "AppStore: applying action");
        let (version, snapshot) = {
            let mut current = self.snapshot.write();
            f(Arc::make_mut(&mut current.snapshot));
            current.version += 1;
            let snapshot = Arc::clone(&current.snapshot);

            self.subscribers
                .write()
                .retain(|tx| tx.try_send(Arc::clone(&snapshot)).is_ok());
            self.versions.send_replace(current.version);

            (current.version, snapshot)
        };
        self.notify_observers(version, &snapshot);
    }

    fn notify_observers(&self, version: u64, snapshot: &AppSnapshot) {
        let observers: Vec<_> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer.on_state_version(version, snapshot);
        }
    }

    pub(crate) fn snapshot_cell(&self) -> Arc<RwLock<VersionedSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    pub(crate) fn version_receiver(&self) -> watch::Receiver<u64> {
        self.versions.subscribe()
    }

    /// Sets the theme and persists it under [`THEME_KEY`].
    ///
    /// A failed write is logged; the in-memory theme changes regardless.
    pub fn set_theme(&self, theme: Theme) {
        if let Err(e) = self.storage.set(THEME_KEY, theme.as_str()) {
            warn!("Failed to persist theme {}: {}", theme.as_str(), e);
        }
        self.apply("set_theme", |s| s.theme = theme);
    }

    /// Switches the main window panel.
    pub fn set_current_view(&self, view: View) {
        self.apply("set_current_view", |s| s.current_view = view);
    }

    /// Sets or clears the file being worked on.
    pub fn set_current_file(&self, file: Option<FileInfo>) {
        self.apply("set_current_file", |s| s.current_file = file);
    }

    /// Sets or clears the OCR result. The text buffers are left alone.
    pub fn set_ocr_result(&self, result: Option<OcrResult>) {
        self.apply("set_ocr_result", |s| s.ocr_result = result);
    }

    /// Stores a finished OCR result and seeds both text buffers with its
    /// text.
    pub fn set_ocr_result_with_text(&self, result: OcrResult) {
        self.apply("set_ocr_result_with_text", |s| {
            s.original_text = result.text.clone();
            s.edited_text = result.text.clone();
            s.ocr_result = Some(result);
        });
    }

    pub fn set_grammar_result(&self, result: Option<GrammarCheckResult>) {
        self.apply("set_grammar_result", |s| s.grammar_result = result);
    }

    /// Replaces the baseline text the edit buffer is compared against.
    pub fn set_original_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.apply("set_original_text", |s| s.original_text = text);
    }

    /// Replaces the user-editable text buffer.
    pub fn set_edited_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.apply("set_edited_text", |s| s.edited_text = text);
    }

    /// Sets or clears the error banner message.
    pub fn set_error(&self, error: Option<String>) {
        self.apply("set_error", |s| s.error = error);
    }

    /// Surfaces a collaborator failure in the error slot.
    pub fn report_error(&self, error: &AppError) {
        debug!(code = ?error.code, "AppStore: collaborator reported error");
        self.report_failure(&AnyhowError::new(error.clone()));
    }

    /// Logs `error` and shows its user-facing message in the error slot.
    ///
    /// The message is the first [`AppError`] in the chain when there is
    /// one, so context added on the way up only reaches the log.
    pub fn report_failure(&self, error: &AnyhowError) {
        ErrorReporter::error(error, "collaborator");
        self.set_error(Some(ErrorReporter::to_user_message(error)));
    }

    pub fn set_is_loading(&self, value: bool) {
        self.apply("set_is_loading", |s| s.is_loading = value);
    }

    pub fn set_is_processing_ocr(&self, value: bool) {
        self.apply("set_is_processing_ocr", |s| s.is_processing_ocr = value);
    }

    pub fn set_is_checking_grammar(&self, value: bool) {
        self.apply("set_is_checking_grammar", |s| s.is_checking_grammar = value);
    }

    pub fn set_is_exporting(&self, value: bool) {
        self.apply("set_is_exporting", |s| s.is_exporting = value);
    }

    /// Replaces the options the next OCR run is started with.
    pub fn set_preprocessing_options(&self, options: PreprocessingOptions) {
        self.apply("set_preprocessing_options", |s| {
            s.preprocessing_options = options;
        });
    }

    pub fn set_language_stats(&self, stats: Option<LanguageStats>) {
        self.apply("set_language_stats", |s| s.language_stats = stats);
    }

    /// Recomputes `language_stats` from the edit buffer.
    pub fn refresh_language_stats(&self) {
        self.apply("refresh_language_stats", |s| {
            s.language_stats = Some(LanguageStats::from_text(&s.edited_text));
        });
    }

    /// Sets or clears the running batch's progress.
    pub fn set_batch_progress(&self, progress: Option<BatchProgress>) {
        self.apply("set_batch_progress", |s| s.batch_progress = progress);
    }

    /// Prepends `record` so `export_history[0]` is always the latest.
    pub fn add_export_record(&self, record: ExportRecord) {
        self.apply("add_export_record", |s| s.export_history.insert(0, record));
    }

    /// Starts over on the current document.
    ///
    /// Clears the file, OCR and grammar results, both text buffers, the
    /// derived language statistics and the error. Theme, current view,
    /// export history, busy flags, preprocessing options and batch progress
    /// are kept.
    pub fn clear_all(&self) {
        self.apply("clear_all", |s| {
            s.current_file = None;
            s.ocr_result = None;
            s.grammar_result = None;
            s.original_text.clear();
            s.edited_text.clear();
            s.language_stats = None;
            s.error = None;
        });
    }

    #[must_use]
    pub fn is_text_modified(&self) -> bool {
        self.snapshot.read().snapshot.is_text_modified()
    }

    #[must_use]
    pub fn latest_export(&self) -> Option<ExportRecord> {
        self.snapshot.read().snapshot.latest_export().cloned()
    }

    /// Subscribes to every new snapshot.
    ///
    /// The channel is unbounded and queued snapshots stay alive until they
    /// are received, which also makes the next write copy the snapshot.
    /// Drain it promptly; a panel that only needs the newest value should
    /// use [`AppStore::view`] instead.
    ///
    /// # Returns
    ///
    /// A receiver that gets one snapshot per action, in write order.
    /// Dropping it unsubscribes on the next broadcast.
    pub fn subscribe(&self) -> Receiver<Arc<AppSnapshot>> {
        debug!("AppStore: New subscription created");

        let (tx, rx) = unbounded();
        self.subscribers.write().push(tx);

        rx
    }

    /// Registers a synchronous observer.
    pub fn add_observer(&self, observer: Arc<dyn StateObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// Unregisters an observer. Returns `false` if `id` was not registered.
    pub fn remove_observer(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        observers.len() != before
    }

    /// Calls `callback` whenever the value projected by `selector` changes.
    ///
    /// The baseline is the projection of the current snapshot, so the
    /// callback does not fire on registration. With concurrent writers the
    /// last callback always carries the projection of the newest snapshot.
    /// Callbacks of different watches that write to the store from
    /// different threads at the same time can deadlock each other.
    pub fn watch<T, S, F>(&self, selector: S, callback: F) -> SubscriptionId
    where
        T: Clone + PartialEq + Send + 'static,
        S: Fn(&AppSnapshot) -> T + Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let (version, snapshot) = self.versioned();
        let observer = Arc::new(SelectorObserver {
            last: ReentrantMutex::new(RefCell::new(Delivered {
                version,
                value: selector(&snapshot),
            })),
            selector,
            callback,
        });
        let id = self.add_observer(observer.clone());

        // Catch up on writes whose broadcast ran before registration.
        let (version, snapshot) = self.versioned();
        observer.on_state_version(version, &snapshot);
        id
    }

    fn versioned(&self) -> (u64, Arc<AppSnapshot>) {
        let current = self.snapshot.read();
        (current.version, Arc::clone(&current.snapshot))
    }
}
