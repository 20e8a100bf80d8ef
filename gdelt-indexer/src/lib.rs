//! # GDELT Indexer
//!
//! Periodically pulls the GDELT event export, reduces it to a fixed set of
//! columns and rebuilds an event graph in ArangoDB.
//!
//! ## Architecture
//!
//! The indexer is a three-stage pipeline handing files over through
//! directories:
//!
//! 1. **Acquirer**: Downloads and unzips the newest feed archive
//! 2. **Cleaner**: Projects raw rows onto the canonical columns
//! 3. **Materializer**: Rebuilds the graph from the canonical file
//! 4. **Orchestrator**: Runs the stages on a fixed tick
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`acquirer`]: Pointer polling, download, extraction
//! - [`cleaner`]: Raw to canonical CSV
//! - [`materializer`]: Canonical CSV to graph
//! - [`queue`]: Directory hand-off helpers
//! - [`orchestrator`]: Coordinates the stages
//! - [`server`]: REST endpoint over the graph
//! - [`errors`]: Error types for the indexer

pub mod acquirer;
pub mod cleaner;
pub mod config;
pub mod errors;
pub mod materializer;
pub mod orchestrator;
pub mod queue;
pub mod server;

pub use config::{Dependencies, IngestConfig};
pub use errors::IngestError;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// REST server error.
    #[error("Server error: {0}")]
    ServerError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
