//! Backend selection for the graph store.

use std::sync::Arc;

use crate::arangodb::ArangoProvider;
use crate::config::ArangoConfig;
use crate::errors::GraphStoreError;
use crate::interfaces::GraphStore;
use crate::memory::MemoryGraphStore;

/// Which graph store backend to construct.
///
/// # Example
///
/// ```ignore
/// use gdelt_indexer_repository::{ArangoConfig, GraphStoreSource};
///
/// // Local runs and tests: keep everything in memory
/// let store = GraphStoreSource::Memory.into_store()?;
///
/// // Production: talk to ArangoDB
/// let store = GraphStoreSource::arango(ArangoConfig::default()).into_store()?;
/// ```
#[derive(Debug, Clone)]
pub enum GraphStoreSource {
    /// In-process store, empty at startup.
    Memory,

    /// Connect to an ArangoDB server.
    Arango(ArangoConfig),
}

impl GraphStoreSource {
    pub fn arango(config: ArangoConfig) -> Self {
        Self::Arango(config)
    }

    /// Short backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Arango(_) => "arango",
        }
    }

    /// Build the store as a shareable trait object.
    pub fn into_store(self) -> Result<Arc<dyn GraphStore>, GraphStoreError> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryGraphStore::new())),
            Self::Arango(config) => Ok(Arc::new(ArangoProvider::new(config)?)),
        }
    }
}
