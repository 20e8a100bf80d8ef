//! Error types for the materializer stage.
//!
//! Only failures that abort a whole run live here. Per-row failures are
//! recorded in the run report instead.

use gdelt_indexer_repository::GraphStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The store could not be prepared (collections or truncation).
    #[error("Graph store error: {0}")]
    Store(#[from] GraphStoreError),

    /// The canonical file header could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
