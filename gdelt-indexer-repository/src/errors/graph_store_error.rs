//! Graph store error types.
//!
//! This module defines the unified error type for all graph store operations,
//! for both the ArangoDB and the in-memory backend.

use thiserror::Error;

/// Unified errors from graph store operations.
#[derive(Debug, Clone, Error)]
pub enum GraphStoreError {
    /// Failed to reach the graph store backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A document with the same key already exists.
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Failed to insert a document.
    #[error("Insert error: {0}")]
    InsertError(String),

    /// Failed to truncate a collection.
    #[error("Truncate error: {0}")]
    TruncateError(String),

    /// Failed to create or inspect a database or collection.
    #[error("Collection error: {0}")]
    CollectionError(String),

    /// A query failed to execute.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse a response from the backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl GraphStoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a conflict error for a duplicate key.
    pub fn conflict(collection: &str, key: &str) -> Self {
        Self::ConflictError(format!("collection={}, key={}", collection, key))
    }

    /// Create an insert error.
    pub fn insert(msg: impl Into<String>) -> Self {
        Self::InsertError(msg.into())
    }

    /// Create a truncate error.
    pub fn truncate(msg: impl Into<String>) -> Self {
        Self::TruncateError(msg.into())
    }

    /// Create a collection error.
    pub fn collection(msg: impl Into<String>) -> Self {
        Self::CollectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Whether this error is a duplicate-key conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConflictError(_))
    }
}
