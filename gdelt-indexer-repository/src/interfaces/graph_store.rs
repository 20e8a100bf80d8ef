//! Graph store trait definition.
//!
//! This module defines the abstract interface for the persistence operations
//! the pipeline needs, allowing different backend implementations (ArangoDB,
//! in-memory).

use async_trait::async_trait;
use gdelt_indexer_shared::{Collection, LocatedEvent};
use serde_json::Value;

use crate::errors::GraphStoreError;

/// Abstracts the underlying graph database.
///
/// Implementations own no business logic: they persist and return documents
/// for the four fixed collections. Implementations are injected into the
/// materializer and the REST layer as `Arc<dyn GraphStore>`.
///
/// # Initialization
///
/// Callers should invoke `ensure_collections` before the first write. It is
/// idempotent and cheap when everything already exists.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), GraphStoreError>;

    /// Create the database and the four collections if they are missing.
    ///
    /// `Events`, `Actors` and `Locations` are document collections;
    /// `EventRelations` is an edge collection.
    async fn ensure_collections(&self) -> Result<(), GraphStoreError>;

    /// Remove every document of one collection.
    async fn truncate(&self, collection: Collection) -> Result<(), GraphStoreError>;

    /// Insert one document.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The document was stored
    /// * `Err(GraphStoreError::ConflictError)` - A document with the same `_key` exists
    /// * `Err(GraphStoreError)` - Any other backend failure
    async fn insert(&self, collection: Collection, document: &Value)
        -> Result<(), GraphStoreError>;

    /// Number of documents in a collection.
    async fn count(&self, collection: Collection) -> Result<u64, GraphStoreError>;

    /// Events that have an `OCCURRED_AT` location, joined with their actor.
    ///
    /// Events without a location are excluded. `limit` caps the number of
    /// results when set.
    async fn located_events(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LocatedEvent>, GraphStoreError>;

    /// Truncate all four collections, vertices first.
    async fn truncate_all(&self) -> Result<(), GraphStoreError> {
        for collection in Collection::ALL {
            self.truncate(collection).await?;
        }
        Ok(())
    }
}
