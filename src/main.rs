//! OCR Assistant State - headless entry point
//!
//! Opens the persistent storage, builds the application store and reports
//! the restored state. Passing `light`, `dark` or `system` switches and
//! persists the theme.

use std::{env::args, sync::Arc};

use {
    anyhow::Result,
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
};

use ocr_assistant_state::{
    AppStore, ErrorReporter, JsonFileStorage, KeyValueStorage, MemoryStorage, Theme,
    error::ResultExt,
    state::UiState,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let storage: Arc<dyn KeyValueStorage> =
        match JsonFileStorage::new().add_context("Failed to open persistent storage") {
            Ok(storage) => {
                info!("Using storage file {:?}", storage.path());
                Arc::new(storage)
            }
            Err(e) => {
                ErrorReporter::warn(&e, "storage");
                warn!("Falling back to in-memory storage");
                Arc::new(MemoryStorage::new())
            }
        };

    let store = AppStore::new(storage);
    let mut ui = store.view::<UiState>();
    info!(theme = ?ui.current().theme, view = ?ui.current().current_view, "Restored state");

    if let Some(requested) = args().nth(1) {
        let theme: Theme = requested
            .parse()
            .add_contextf(format!("Invalid theme argument '{requested}'"))?;
        store.set_theme(theme);

        if let Some(changed) = ui.try_changed() {
            info!(theme = ?changed.theme, "Theme updated");
        }
    }

    Ok(())
}
