//! Persistent key-value storage with XDG Base Directory compliance.
//!
//! The application state store persists a single key (`theme`) through the
//! [`KeyValueStorage`] trait. The on-disk implementation keeps every key in
//! one flat JSON object so other panels can share the file later without a
//! format change.

use std::{
    collections::BTreeMap,
    env::var,
    fmt::Debug,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
};

use {
    parking_lot::RwLock,
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write the storage file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize the storage file.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid stored value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// String-keyed persistent storage.
///
/// Reads never fail: a missing key and an unreadable backend both look like
/// an absent value to the caller.
pub trait KeyValueStorage: Send + Sync + Debug {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Volatile storage for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates in-memory storage pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file backed storage.
///
/// The whole file is loaded once on construction and rewritten on every
/// `set`.
#[derive(Debug)]
pub struct JsonFileStorage {
    /// In-memory mirror of the file contents.
    entries: RwLock<BTreeMap<String, String>>,
    /// Path to the storage file on disk.
    path: PathBuf,
}

impl JsonFileStorage {
    /// Creates storage at the default XDG config path.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if an existing file cannot be loaded.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_path(get_storage_path())
    }

    /// Creates storage backed by a custom file (for testing).
    ///
    /// # Arguments
    ///
    /// * `path` - Custom path for the storage file
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the parent directory cannot be created or
    /// an existing file cannot be parsed.
    pub fn with_path(path: PathBuf) -> Result<Self, SettingsError> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            debug!("Loading storage from existing file: {:?}", path);
            let contents = read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                from_str(&contents)?
            }
        } else {
            debug!("No storage file yet, starting empty: {:?}", path);
            BTreeMap::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            path,
        })
    }

    /// Gets the storage file path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());

        debug!(key, "Saving storage to file: {:?}", self.path);
        let contents = to_string_pretty(&*entries)?;
        write(&self.path, contents)?;
        Ok(())
    }
}

/// Resolves the storage file path under the XDG config directory.
#[must_use]
pub fn get_storage_path() -> PathBuf {
    let mut config_dir = get_xdg_config_home();
    config_dir.push("ocr-assistant");
    config_dir.push("storage.json");
    config_dir
}

/// Gets the XDG config home directory following XDG Base Directory specification.
///
/// Uses `XDG_CONFIG_HOME` environment variable if set, otherwise defaults to $HOME/.config
fn get_xdg_config_home() -> PathBuf {
    if let Ok(config_home) = var("XDG_CONFIG_HOME")
        && !config_home.is_empty()
    {
        return PathBuf::from(config_home);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".config");
        return path;
    }

    PathBuf::from(".")
}
