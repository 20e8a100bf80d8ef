//! Error types for the cleaner stage.

use thiserror::Error;

/// Errors that can occur while converting a raw export file.
#[derive(Debug, Error)]
pub enum CleanError {
    /// No row of the raw file has the width the column map expects.
    ///
    /// Deterministic: retrying the same file cannot succeed.
    #[error("Schema mismatch in {file}: expected {expected} fields per row, first row has {found}")]
    SchemaMismatch {
        file: String,
        expected: usize,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking cleaning task panicked or was cancelled.
    #[error("Cleaning task failed: {0}")]
    Task(String),
}

impl CleanError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }
}
