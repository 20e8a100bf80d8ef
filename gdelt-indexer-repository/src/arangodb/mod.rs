//! ArangoDB implementation of the graph store.
//!
//! This module provides a concrete implementation of `GraphStore` speaking
//! the ArangoDB HTTP API.

mod collection_config;
mod provider;

pub use collection_config::{collection_type_code, located_events_query};
pub use provider::ArangoProvider;
