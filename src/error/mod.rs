//! Error handling using `thiserror` and `anyhow`.
//!
//! This module provides the collaborator error taxonomy and operational
//! error context propagation for rich debugging information.

pub mod domain;
pub mod operational;

pub use {
    domain::{AppError, ErrorCode},
    operational::{ErrorReporter, ResultExt},
};
