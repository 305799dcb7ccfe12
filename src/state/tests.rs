//! Behavioural tests for the application store and its selector views.
//!
//! These cover last-write-wins setters, newest-first export history, the
//! partial reset performed by `clear_all`, theme persistence, the
//! change filtering of selector views and delivery order under concurrent
//! writers. A property test checks random setter sequences against a
//! plain model.

#[cfg(test)]
mod store_tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    use {
        anyhow::{Error as AnyhowError, anyhow},
        parking_lot::Mutex,
        tempfile::TempDir,
        tokio::{
            test as TokioTest,
            time::{Duration, timeout},
        },
    };

    use crate::{
        config::{JsonFileStorage, KeyValueStorage, MemoryStorage, SettingsError},
        error::{AppError, ErrorCode},
        models::{
            BatchProgress, ExportRecord, FileInfo, GrammarCheckResult, LanguageStats, OcrResult,
            PreprocessingOptions,
        },
        state::{
            AppSnapshot, AppStore, ExportState, FileState, Projection, TextState, THEME_KEY, Theme,
            UiState, View,
        },
    };

    // Default timeout in milliseconds for test async operations
    const TEST_TIMEOUT_MS: u64 = 1000;

    fn memory_store() -> AppStore {
        AppStore::new(Arc::new(MemoryStorage::new()))
    }

    fn record(id: &str) -> ExportRecord {
        let mut record = ExportRecord::new("image");
        record.id = id.to_string();
        record
    }

    fn ocr_result(text: &str) -> OcrResult {
        OcrResult {
            text: text.to_string(),
            confidence: 0.9,
            engine_used: "tesseract".to_string(),
            processing_time: 0.5,
            word_details: vec![],
        }
    }

    /// Storage whose writes always fail.
    #[derive(Debug)]
    struct ReadOnlyStorage;

    impl KeyValueStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), SettingsError> {
            Err(SettingsError::InvalidValue {
                reason: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn test_last_write_wins_per_field() {
        let store = memory_store();

        store.set_edited_text("first");
        store.set_current_view(View::Batch);
        store.set_edited_text("second");
        store.set_is_loading(true);
        store.set_current_view(View::History);
        store.set_is_loading(false);
        store.set_error(Some("boom".to_string()));
        store.set_error(Some("bang".to_string()));

        let snapshot = store.get();
        assert_eq!(snapshot.edited_text, "second");
        assert_eq!(snapshot.current_view, View::History);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error.as_deref(), Some("bang"));
        assert!(snapshot.original_text.is_empty());
    }

    #[test]
    fn test_flags_are_independent() {
        let store = memory_store();
        store.set_is_processing_ocr(true);
        store.set_is_checking_grammar(true);
        store.set_is_exporting(true);

        let snapshot = store.get();
        assert!(snapshot.is_processing_ocr);
        assert!(snapshot.is_checking_grammar);
        assert!(snapshot.is_exporting);
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn test_no_cross_field_rules() {
        let store = memory_store();
        store.set_ocr_result(Some(ocr_result("text")));

        let snapshot = store.get();
        assert!(snapshot.ocr_result.is_some());
        assert!(!snapshot.is_processing_ocr);
        assert!(snapshot.original_text.is_empty());
    }

    #[test]
    fn test_export_history_is_newest_first() {
        let store = memory_store();
        assert!(store.get().export_history.is_empty());

        store.add_export_record(record("1"));
        store.add_export_record(record("2"));

        let ids: Vec<_> = store
            .get()
            .export_history
            .iter()
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(ids, ["2", "1"]);
        assert_eq!(store.latest_export().unwrap().id, "2");

        store.add_export_record(record("3"));
        let ids: Vec<_> = store
            .get()
            .export_history
            .iter()
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(ids, ["3", "2", "1"]);
    }

    #[test]
    fn test_clear_all_resets_document_state() {
        let store = memory_store();
        store.set_original_text("hello");
        store.set_edited_text("hello world");
        store.clear_all();

        let snapshot = store.get();
        assert_eq!(snapshot.original_text, "");
        assert_eq!(snapshot.edited_text, "");
    }

    #[test]
    fn test_clear_all_keeps_theme_view_and_history() {
        let store = memory_store();
        store.set_theme(Theme::Dark);
        store.set_current_view(View::History);
        store.add_export_record(record("1"));
        store.set_current_file(Some(FileInfo::from_path("/tmp/scan.png", 10)));
        store.set_ocr_result(Some(ocr_result("abc")));
        store.set_grammar_result(Some(GrammarCheckResult::default()));
        store.set_original_text("abc");
        store.set_edited_text("abcd");
        store.set_error(Some("failed".to_string()));
        store.refresh_language_stats();

        store.clear_all();
        let snapshot = store.get();

        assert!(snapshot.current_file.is_none());
        assert!(snapshot.ocr_result.is_none());
        assert!(snapshot.grammar_result.is_none());
        assert!(snapshot.original_text.is_empty());
        assert!(snapshot.edited_text.is_empty());
        assert!(snapshot.error.is_none());
        assert!(snapshot.language_stats.is_none());

        assert_eq!(snapshot.theme, Theme::Dark);
        assert_eq!(snapshot.current_view, View::History);
        assert_eq!(snapshot.export_history.len(), 1);
        assert_eq!(snapshot.export_history[0].id, "1");
    }

    #[test]
    fn test_clear_all_keeps_flags_and_settings() {
        let store = memory_store();
        let options = PreprocessingOptions {
            denoise: false,
            ..PreprocessingOptions::default()
        };
        store.set_preprocessing_options(options.clone());
        store.set_is_exporting(true);
        store.set_batch_progress(Some(BatchProgress {
            total_files: 3,
            ..BatchProgress::default()
        }));

        store.clear_all();
        let snapshot = store.get();
        assert_eq!(snapshot.preprocessing_options, options);
        assert!(snapshot.is_exporting);
        assert_eq!(snapshot.batch_progress.as_ref().unwrap().total_files, 3);
    }

    #[test]
    fn test_set_theme_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let store = AppStore::new(storage.clone());
        assert_eq!(store.get().theme, Theme::System);

        store.set_theme(Theme::Dark);
        assert_eq!(store.get().theme, Theme::Dark);
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn test_theme_restored_from_storage() {
        let storage = Arc::new(MemoryStorage::with_entries([(THEME_KEY, "light")]));
        assert_eq!(AppStore::new(storage).get().theme, Theme::Light);
    }

    #[test]
    fn test_unknown_stored_theme_defaults_to_system() {
        let storage = Arc::new(MemoryStorage::with_entries([(THEME_KEY, "solarized")]));
        assert_eq!(AppStore::new(storage).get().theme, Theme::System);
    }

    #[test]
    fn test_failed_theme_write_still_updates_state() {
        let store = AppStore::new(Arc::new(ReadOnlyStorage));
        store.set_theme(Theme::Light);
        assert_eq!(store.get().theme, Theme::Light);
    }

    #[test]
    fn test_theme_persists_across_sessions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        let first = AppStore::new(Arc::new(JsonFileStorage::with_path(path.clone()).unwrap()));
        assert_eq!(first.get().theme, Theme::System);
        first.set_theme(Theme::Dark);
        first.set_edited_text("not persisted");

        let second = AppStore::new(Arc::new(JsonFileStorage::with_path(path).unwrap()));
        assert_eq!(second.get().theme, Theme::Dark);
        assert!(second.get().edited_text.is_empty());
    }

    #[test]
    fn test_ocr_result_with_text_seeds_buffers() {
        let store = memory_store();
        store.set_ocr_result_with_text(ocr_result("scanned text"));

        let snapshot = store.get();
        assert_eq!(snapshot.original_text, "scanned text");
        assert_eq!(snapshot.edited_text, "scanned text");
        assert_eq!(snapshot.ocr_result.as_ref().unwrap().text, "scanned text");
        assert!(!store.is_text_modified());

        store.set_edited_text("edited text");
        assert!(store.is_text_modified());
    }

    #[test]
    fn test_refresh_language_stats_uses_edit_buffer() {
        let store = memory_store();
        store.set_original_text("one");
        store.set_edited_text("one two three.");
        store.refresh_language_stats();

        assert_eq!(
            store.get().language_stats,
            Some(LanguageStats::from_text("one two three."))
        );
        assert_eq!(store.get().language_stats.unwrap().words, 3);
    }

    #[test]
    fn test_report_error_uses_user_message() {
        let store = memory_store();
        store.report_error(&AppError::with_details(
            ErrorCode::LanguageToolConnection,
            "Grammar server unreachable",
            "timeout",
        ));
        assert_eq!(
            store.get().error.as_deref(),
            Some("Grammar server unreachable: timeout")
        );

        store.set_error(None);
        assert!(store.get().error.is_none());
    }

    #[test]
    fn test_report_failure_shows_collaborator_message() {
        let store = memory_store();
        let failure = AnyhowError::new(AppError::file_not_found("/tmp/missing.png"))
            .context("Loading dropped file");
        store.report_failure(&failure);
        assert_eq!(
            store.get().error.as_deref(),
            Some("File not found: /tmp/missing.png")
        );

        store.report_failure(&anyhow!("disk full"));
        assert_eq!(store.get().error.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_update_batches_fields_into_one_notification() {
        let store = memory_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        store.add_observer(Arc::new(move |_: &AppSnapshot| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.update(|s| {
            s.is_processing_ocr = false;
            s.is_loading = false;
            s.error = Some("OCR failed".to_string());
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get().error.as_deref(), Some("OCR failed"));
    }

    #[test]
    fn test_observers_notified_in_order_and_removable() {
        let store = memory_store();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first_log = log.clone();
        let first = store.add_observer(Arc::new(move |s: &AppSnapshot| {
            first_log.lock().push(format!("first:{}", s.edited_text));
        }));
        let second_log = log.clone();
        store.add_observer(Arc::new(move |s: &AppSnapshot| {
            second_log.lock().push(format!("second:{}", s.edited_text));
        }));

        store.set_edited_text("a");
        assert!(store.remove_observer(first));
        assert!(!store.remove_observer(first));
        store.set_edited_text("b");

        assert_eq!(*log.lock(), ["first:a", "second:a", "second:b"]);
    }

    #[test]
    fn test_observer_may_read_store() {
        let store = memory_store();
        let seen = Arc::new(Mutex::new(None));

        let reader = store.clone();
        let sink = seen.clone();
        store.add_observer(Arc::new(move |_: &AppSnapshot| {
            *sink.lock() = Some(reader.get().current_view);
        }));

        store.set_current_view(View::Batch);
        assert_eq!(*seen.lock(), Some(View::Batch));
    }

    #[test]
    fn test_watch_skips_identical_projections() {
        let store = memory_store();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        store.watch(
            |s: &AppSnapshot| s.edited_text.clone(),
            move |text: &String| sink.lock().push(text.clone()),
        );

        store.set_edited_text("draft");
        store.set_edited_text("draft");
        store.set_is_loading(true);
        store.set_original_text("unrelated");
        store.set_edited_text("final");

        assert_eq!(*seen.lock(), ["draft", "final"]);
    }

    #[test]
    fn test_watch_projection_struct() {
        let store = memory_store();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        store.watch(FileState::project, move |_: &FileState| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set_edited_text("not in file state");
        store.set_current_view(View::Batch);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store.set_is_loading(true);
        store.set_is_loading(true);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_selector_accessors() {
        let store = memory_store();
        store.set_original_text("a");
        store.set_edited_text("b");
        store.set_is_exporting(true);
        store.set_theme(Theme::Light);

        let text = store.text_state();
        assert_eq!(text.original_text, "a");
        assert_eq!(text.edited_text, "b");
        assert!(text.is_modified());

        let export: ExportState = store.export_state();
        assert!(export.is_exporting);
        assert!(export.export_history.is_empty());

        let ui: UiState = store.ui_state();
        assert_eq!(ui.theme, Theme::Light);
        assert_eq!(ui.current_view, View::Main);

        assert!(store.file_state().current_file.is_none());
        assert!(store.ocr_state().ocr_result.is_none());
        assert!(store.grammar_state().grammar_result.is_none());
    }

    #[test]
    fn test_selector_view_try_changed() {
        let store = memory_store();
        let mut view = store.view::<TextState>();
        assert_eq!(view.current().edited_text, "");

        store.set_is_loading(true);
        store.set_current_view(View::Batch);
        assert!(view.try_changed().is_none());

        store.set_edited_text("hello");
        store.set_edited_text("hello");
        let changed = view.try_changed().unwrap();
        assert_eq!(changed.edited_text, "hello");
        assert!(view.try_changed().is_none());
    }

    #[test]
    fn test_selector_view_reverted_change_is_not_reported() {
        let store = memory_store();
        let mut view = store.view::<TextState>();

        store.set_edited_text("temp");
        store.set_edited_text("");
        assert!(view.try_changed().is_none());
    }

    #[TokioTest]
    async fn test_selector_view_changed_async() {
        let store = memory_store();
        let mut view = store.view::<FileState>();

        let writer = store.clone();
        tokio::spawn(async move {
            writer.set_edited_text("ignored");
            writer.set_is_loading(true);
        });

        let changed = timeout(Duration::from_millis(TEST_TIMEOUT_MS), view.changed())
            .await
            .expect("selector view timed out")
            .expect("store dropped");
        assert!(changed.is_loading);
        assert!(view.current().is_loading);
    }

    #[TokioTest]
    async fn test_subscribe_receives_every_snapshot() {
        let store = memory_store();
        let receiver = store.subscribe();

        store.set_current_view(View::History);
        store.set_current_view(View::History);

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.current_view, View::History);
        assert_eq!(first, second);
    }

    #[TokioTest]
    async fn test_dropped_subscribers_are_pruned() {
        let store = memory_store();
        let kept = store.subscribe();
        drop(store.subscribe());

        store.set_is_loading(true);
        store.set_is_loading(false);

        assert_eq!(kept.len(), 2);
        assert!(format!("{store:?}").contains("subscribers: 1"));
    }

    #[test]
    fn test_idle_selector_view_holds_no_snapshots() {
        let store = memory_store();
        let mut view = store.view::<TextState>();

        for i in 0..100 {
            store.set_edited_text(format!("draft {i}"));
        }

        // The store's own reference plus the one returned by `get`.
        assert_eq!(Arc::strong_count(&store.get()), 2);
        assert_eq!(store.version(), 100);
        assert_eq!(view.try_changed().unwrap().edited_text, "draft 99");
        assert!(view.try_changed().is_none());
    }

    #[test]
    fn test_concurrent_writers_settle_on_newest_snapshot() {
        const WRITERS: usize = 8;
        const WRITES: usize = 200;

        let store = memory_store();
        let watched = Arc::new(Mutex::new(String::new()));
        let sink = watched.clone();
        store.watch(
            |s: &AppSnapshot| s.edited_text.clone(),
            move |text: &String| *sink.lock() = text.clone(),
        );
        let mut view = store.view::<TextState>();
        let receiver = store.subscribe();

        let handles: Vec<_> = (0..WRITERS)
            .map(|writer_id| {
                let writer = store.clone();
                thread::spawn(move || {
                    for i in 0..WRITES {
                        writer.set_edited_text(format!("{writer_id}:{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let newest = store.get().edited_text.clone();
        assert_eq!(store.version(), (WRITERS * WRITES) as u64);
        assert_eq!(*watched.lock(), newest);
        assert_eq!(
            view.try_changed().map(|text| text.edited_text),
            Some(newest.clone())
        );

        // The channel carries every write, each writer's in its own order.
        let mut next_index = [0usize; WRITERS];
        let mut last = String::new();
        while let Ok(snapshot) = receiver.try_recv() {
            let (writer_id, index) = snapshot.edited_text.split_once(':').unwrap();
            let writer_id: usize = writer_id.parse().unwrap();
            let index: usize = index.parse().unwrap();
            assert_eq!(index, next_index[writer_id]);
            next_index[writer_id] += 1;
            last = snapshot.edited_text.clone();
        }
        assert_eq!(next_index, [WRITES; WRITERS]);
        assert_eq!(last, newest);
    }

    #[TokioTest]
    async fn test_selector_view_ends_when_store_dropped() {
        let store = memory_store();
        let mut view = store.view::<UiState>();
        drop(store);

        let result = timeout(Duration::from_millis(TEST_TIMEOUT_MS), view.changed())
            .await
            .expect("selector view timed out");
        assert!(result.is_none());
    }
}

#[cfg(test)]
mod store_properties {
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::{
        config::{KeyValueStorage, MemoryStorage},
        models::ExportRecord,
        state::{AppStore, THEME_KEY, Theme, View},
    };

    #[derive(Debug, Clone)]
    enum Action {
        Theme(Theme),
        View(View),
        OriginalText(String),
        EditedText(String),
        Error(Option<String>),
        Loading(bool),
        ProcessingOcr(bool),
        CheckingGrammar(bool),
        Exporting(bool),
        Export(u16),
        ClearAll,
    }

    /// Plain-struct reference for the fields the actions touch.
    #[derive(Debug, Default)]
    struct Model {
        theme: Theme,
        persisted_theme: Option<Theme>,
        view: View,
        original_text: String,
        edited_text: String,
        error: Option<String>,
        is_loading: bool,
        is_processing_ocr: bool,
        is_checking_grammar: bool,
        is_exporting: bool,
        export_ids: Vec<String>,
    }

    impl Model {
        fn apply(&mut self, action: &Action) {
            match action {
                Action::Theme(theme) => {
                    self.theme = *theme;
                    self.persisted_theme = Some(*theme);
                }
                Action::View(view) => self.view = *view,
                Action::OriginalText(text) => self.original_text = text.clone(),
                Action::EditedText(text) => self.edited_text = text.clone(),
                Action::Error(error) => self.error = error.clone(),
                Action::Loading(value) => self.is_loading = *value,
                Action::ProcessingOcr(value) => self.is_processing_ocr = *value,
                Action::CheckingGrammar(value) => self.is_checking_grammar = *value,
                Action::Exporting(value) => self.is_exporting = *value,
                Action::Export(id) => self.export_ids.insert(0, id.to_string()),
                Action::ClearAll => {
                    self.original_text.clear();
                    self.edited_text.clear();
                    self.error = None;
                }
            }
        }
    }

    fn apply_to_store(store: &AppStore, action: &Action) {
        match action {
            Action::Theme(theme) => store.set_theme(*theme),
            Action::View(view) => store.set_current_view(*view),
            Action::OriginalText(text) => store.set_original_text(text.clone()),
            Action::EditedText(text) => store.set_edited_text(text.clone()),
            Action::Error(error) => store.set_error(error.clone()),
            Action::Loading(value) => store.set_is_loading(*value),
            Action::ProcessingOcr(value) => store.set_is_processing_ocr(*value),
            Action::CheckingGrammar(value) => store.set_is_checking_grammar(*value),
            Action::Exporting(value) => store.set_is_exporting(*value),
            Action::Export(id) => {
                let mut record = ExportRecord::new("image");
                record.id = id.to_string();
                store.add_export_record(record);
            }
            Action::ClearAll => store.clear_all(),
        }
    }

    fn arb_theme() -> impl Strategy<Value = Theme> {
        prop_oneof![Just(Theme::Light), Just(Theme::Dark), Just(Theme::System)]
    }

    fn arb_view() -> impl Strategy<Value = View> {
        prop_oneof![Just(View::Main), Just(View::Batch), Just(View::History)]
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            arb_theme().prop_map(Action::Theme),
            arb_view().prop_map(Action::View),
            "[a-z ]{0,8}".prop_map(Action::OriginalText),
            "[a-z ]{0,8}".prop_map(Action::EditedText),
            prop::option::of("[a-z]{1,8}").prop_map(Action::Error),
            any::<bool>().prop_map(Action::Loading),
            any::<bool>().prop_map(Action::ProcessingOcr),
            any::<bool>().prop_map(Action::CheckingGrammar),
            any::<bool>().prop_map(Action::Exporting),
            any::<u16>().prop_map(Action::Export),
            Just(Action::ClearAll),
        ]
    }

    proptest! {
        #[test]
        fn setter_sequences_match_model(actions in prop::collection::vec(arb_action(), 0..40)) {
            let storage = Arc::new(MemoryStorage::new());
            let store = AppStore::new(storage.clone());
            let mut model = Model::default();

            for (step, action) in actions.iter().enumerate() {
                apply_to_store(&store, action);
                model.apply(action);

                let snapshot = store.get();
                prop_assert_eq!(store.version(), step as u64 + 1);
                prop_assert_eq!(snapshot.theme, model.theme);
                prop_assert_eq!(snapshot.current_view, model.view);
                prop_assert_eq!(&snapshot.original_text, &model.original_text);
                prop_assert_eq!(&snapshot.edited_text, &model.edited_text);
                prop_assert_eq!(&snapshot.error, &model.error);
                prop_assert_eq!(snapshot.is_loading, model.is_loading);
                prop_assert_eq!(snapshot.is_processing_ocr, model.is_processing_ocr);
                prop_assert_eq!(snapshot.is_checking_grammar, model.is_checking_grammar);
                prop_assert_eq!(snapshot.is_exporting, model.is_exporting);
                prop_assert_eq!(
                    snapshot.is_text_modified(),
                    model.original_text != model.edited_text
                );

                let ids: Vec<_> = snapshot.export_history.iter().map(|r| r.id.clone()).collect();
                prop_assert_eq!(&ids, &model.export_ids);
                prop_assert_eq!(
                    storage.get(THEME_KEY),
                    model.persisted_theme.map(|theme| theme.as_str().to_string())
                );
            }
        }
    }
}
