//! Error types for the GDELT indexer pipeline.
//!
//! Each stage has its own error enum; `IngestError` wraps them at the
//! orchestrator boundary.

mod acquirer;
mod cleaner;
mod materializer;

pub use acquirer::AcquireError;
pub use cleaner::CleanError;
pub use materializer::MaterializeError;

use thiserror::Error;

/// Errors that can end a pipeline stage run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error from the acquirer stage.
    #[error("Acquire error: {0}")]
    Acquire(#[from] AcquireError),

    /// Error from the cleaner stage.
    #[error("Clean error: {0}")]
    Clean(#[from] CleanError),

    /// Error from the materializer stage.
    #[error("Materialize error: {0}")]
    Materialize(#[from] MaterializeError),

    /// Error from a stage without a dedicated error type.
    #[error("Stage error: {0}")]
    StageError(String),
}

impl IngestError {
    /// Create a stage error.
    pub fn stage(msg: impl Into<String>) -> Self {
        Self::StageError(msg.into())
    }
}
