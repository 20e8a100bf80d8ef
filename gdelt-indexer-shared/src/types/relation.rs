//! Edge documents of the `EventRelations` collection.

use serde::{Deserialize, Serialize};

use super::collection::Collection;
use super::event_document::{actor_key, event_key, location_key};

/// Edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// Event to actor.
    HasActor,
    /// Event to location.
    OccurredAt,
}

/// A directed edge between two vertices, addressed by document handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationDocument {
    #[serde(rename = "_from")]
    pub from: String,
    #[serde(rename = "_to")]
    pub to: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

impl RelationDocument {
    /// `Events/<id>` to `Actors/actor_<id>`.
    pub fn has_actor(event_id: i64) -> Self {
        Self {
            from: Collection::Events.handle(&event_key(event_id)),
            to: Collection::Actors.handle(&actor_key(event_id)),
            relation_type: RelationType::HasActor,
        }
    }

    /// `Events/<id>` to `Locations/loc_<id>`.
    pub fn occurred_at(event_id: i64) -> Self {
        Self {
            from: Collection::Events.handle(&event_key(event_id)),
            to: Collection::Locations.handle(&location_key(event_id)),
            relation_type: RelationType::OccurredAt,
        }
    }

    /// Key part of the `_from` handle.
    pub fn from_key(&self) -> &str {
        self.from.split_once('/').map_or(self.from.as_str(), |(_, k)| k)
    }

    /// Key part of the `_to` handle.
    pub fn to_key(&self) -> &str {
        self.to.split_once('/').map_or(self.to.as_str(), |(_, k)| k)
    }
}
