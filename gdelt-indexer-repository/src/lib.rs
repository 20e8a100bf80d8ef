//! # GDELT Indexer Repository
//!
//! This crate provides the graph store adapter used by the GDELT indexer.
//! It defines the `GraphStore` interface, its error type, an ArangoDB
//! implementation speaking the HTTP API, and an in-memory implementation for
//! local runs and tests.

pub mod arangodb;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod source;

pub use arangodb::ArangoProvider;
pub use config::ArangoConfig;
pub use errors::GraphStoreError;
pub use interfaces::GraphStore;
pub use memory::MemoryGraphStore;
pub use source::GraphStoreSource;
