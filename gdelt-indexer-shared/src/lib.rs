//! # GDELT Indexer Shared
//!
//! This crate defines the data structures shared across the GDELT indexer
//! ecosystem: the fixed column mapping of the event-export feed, the canonical
//! row format, and the vertex/edge documents written to the graph store.

pub mod schema;
pub mod types;

pub use schema::{canonical_header, project, ColumnMapping, COLUMN_MAP, MIN_RAW_FIELDS};
pub use types::{
    actor_key, event_key, location_key, ActorDocument, CanonicalRow, Collection, CollectionKind,
    EventDocument, LocatedEvent, LocationDocument, QuadClass, RelationDocument, RelationType,
};
