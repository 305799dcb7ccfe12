//! Persistent key-value storage for user preferences.
//!
//! This module provides the storage boundary the application state store
//! persists its theme through, with XDG Base Directory compliance.

pub mod storage;

pub use storage::{
    JsonFileStorage, KeyValueStorage, MemoryStorage, SettingsError, get_storage_path,
};
