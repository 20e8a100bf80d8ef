//! Error types for the graph store repository.

mod graph_store_error;

pub use graph_store_error::GraphStoreError;
