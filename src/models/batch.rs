//! Batch runner progress reports.

use serde::{Deserialize, Serialize};

/// Snapshot of a running (or finished) batch job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchProgress {
    pub is_processing: bool,
    /// Zero-based index of the file being processed.
    pub current_file_index: usize,
    pub total_files: usize,
    pub completed_files: usize,
    pub failed_files: usize,
    pub elapsed_time_seconds: f64,
    pub estimated_remaining_seconds: f64,
    pub current_file_path: String,
}

impl BatchProgress {
    /// Share of files finished (successfully or not), in `0.0..=100.0`.
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        let done = (self.completed_files + self.failed_files).min(self.total_files);
        done as f64 / self.total_files as f64 * 100.0
    }
}
