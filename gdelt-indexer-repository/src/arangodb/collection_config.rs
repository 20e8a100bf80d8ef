//! Collection settings and the fixed AQL traversal.

use gdelt_indexer_shared::{CollectionKind, RelationType};

/// ArangoDB collection type code: 2 for documents, 3 for edges.
pub fn collection_type_code(kind: CollectionKind) -> u8 {
    match kind {
        CollectionKind::Document => 2,
        CollectionKind::Edge => 3,
    }
}

fn relation_label(relation: RelationType) -> &'static str {
    match relation {
        RelationType::HasActor => "HAS_ACTOR",
        RelationType::OccurredAt => "OCCURRED_AT",
    }
}

/// AQL returning every event with an `OCCURRED_AT` location, joined with its
/// `HAS_ACTOR` actor, in random order.
///
/// With `limited` set the query expects a `@limit` bind variable.
pub fn located_events_query(limited: bool) -> String {
    let limit_clause = if limited { "\n  LIMIT @limit" } else { "" };
    format!(
        r#"WITH Events, Actors, Locations, EventRelations
FOR event IN Events
  LET location = FIRST(
    FOR v, e IN 1..1 OUTBOUND event EventRelations
      FILTER e.type == "{occurred_at}"
      RETURN v
  )
  FILTER location != null
  LET actor = FIRST(
    FOR v, e IN 1..1 OUTBOUND event EventRelations
      FILTER e.type == "{has_actor}"
      RETURN v
  )
  SORT RAND(){limit_clause}
  RETURN {{
    source: event.source,
    goldsteinscore: event.goldsteinScale,
    quadclass: event.quadClass,
    fullname: location.fullname,
    countryCode: location.countryCode,
    actorCountryCode: actor.countryCode,
    actorFilter: actor.type3Code,
    coordinates: [location.latitude, location.longitude]
  }}"#,
        occurred_at = relation_label(RelationType::OccurredAt),
        has_actor = relation_label(RelationType::HasActor),
        limit_clause = limit_clause,
    )
}
