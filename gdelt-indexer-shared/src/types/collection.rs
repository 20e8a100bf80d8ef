//! Fixed collection names of the event graph.

use std::fmt;

/// Whether a collection holds vertices or edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Document,
    Edge,
}

/// The four collections the materializer rebuilds on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Events,
    Actors,
    Locations,
    EventRelations,
}

impl Collection {
    /// All collections, vertices first.
    pub const ALL: [Collection; 4] = [
        Collection::Events,
        Collection::Actors,
        Collection::Locations,
        Collection::EventRelations,
    ];

    /// Returns the collection name as stored in the graph database.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Events => "Events",
            Collection::Actors => "Actors",
            Collection::Locations => "Locations",
            Collection::EventRelations => "EventRelations",
        }
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Collection::EventRelations => CollectionKind::Edge,
            _ => CollectionKind::Document,
        }
    }

    /// Document handle (`Collection/key`) used by edge endpoints.
    pub fn handle(&self, key: &str) -> String {
        format!("{}/{}", self.name(), key)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
