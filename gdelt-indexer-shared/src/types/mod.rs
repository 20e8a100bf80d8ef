//! This module defines the core data structures used across the indexer.
//! It re-exports the graph documents, collection names and row types.

pub mod canonical_row;
pub mod collection;
pub mod event_document;
pub mod located_event;
pub mod relation;

pub use canonical_row::CanonicalRow;
pub use collection::{Collection, CollectionKind};
pub use event_document::{
    actor_key, event_key, location_key, ActorDocument, EventDocument, LocationDocument, QuadClass,
};
pub use located_event::LocatedEvent;
pub use relation::{RelationDocument, RelationType};
