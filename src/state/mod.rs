//! Centralized state management with reactive updates to UI components.
//!
//! This module provides the shared application store, its selector views
//! and the observer interface panels register through.

#[cfg(test)]
mod tests;

pub mod app_store;
pub mod selectors;

pub use {
    app_store::{
        AppSnapshot, AppStore, StateObserver, SubscriptionId, THEME_KEY, Theme, View,
    },
    selectors::{
        ExportState, FileState, GrammarState, OcrState, Projection, SelectorView, TextState,
        UiState,
    },
};
