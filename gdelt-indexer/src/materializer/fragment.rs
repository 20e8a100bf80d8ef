//! Row to graph-fragment transform.

use std::fmt;

use gdelt_indexer_shared::{
    ActorDocument, CanonicalRow, EventDocument, LocationDocument, QuadClass, RelationDocument,
};

/// Why a canonical row did not make it into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// The row could not be read as a canonical record.
    Malformed,
    MissingEventId,
    InvalidEventId,
    /// A generated key already existed in the store.
    Conflict,
    /// Any other store failure while writing the row.
    StoreWrite,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Malformed => "malformed",
            FailureKind::MissingEventId => "missing_event_id",
            FailureKind::InvalidEventId => "invalid_event_id",
            FailureKind::Conflict => "conflict",
            FailureKind::StoreWrite => "store_write",
        };
        f.write_str(name)
    }
}

/// A failed row with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Vertices of this row already in the store when the failure hit.
    pub vertices_left: usize,
    /// Edges of this row already in the store when the failure hit.
    pub edges_left: usize,
}

impl RowFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            vertices_left: 0,
            edges_left: 0,
        }
    }

    /// Record documents a partially written row left in the store.
    pub fn left_behind(mut self, vertices: usize, edges: usize) -> Self {
        if vertices + edges > 0 {
            self.message = format!(
                "{} (left behind: {} vertices, {} edges)",
                self.message, vertices, edges
            );
        }
        self.vertices_left = vertices;
        self.edges_left = edges;
        self
    }
}

/// Documents derived from one canonical row.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphFragment {
    pub event_id: i64,
    pub event: EventDocument,
    pub actor: ActorDocument,
    /// Present iff latitude and longitude both parse as finite numbers.
    pub location: Option<LocationDocument>,
    pub has_actor: RelationDocument,
    /// Present iff `location` is.
    pub occurred_at: Option<RelationDocument>,
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse integral text; `"020"` and `"20.0"` both yield 20.
pub fn parse_int(value: &Option<String>) -> Option<i64> {
    let value = value.as_deref()?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// Parse finite floating point text.
pub fn parse_float(value: &Option<String>) -> Option<f64> {
    value
        .as_deref()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Build the vertex and edge documents for one row.
///
/// Only the event id is required; every other unparsable or empty value is
/// omitted from its document.
pub fn build_fragment(row: &CanonicalRow) -> Result<GraphFragment, RowFailure> {
    let raw_id = text(&row.global_event_id)
        .ok_or_else(|| RowFailure::new(FailureKind::MissingEventId, "GlobalEventID is empty"))?;
    let event_id = parse_int(&Some(raw_id.clone())).ok_or_else(|| {
        RowFailure::new(
            FailureKind::InvalidEventId,
            format!("GlobalEventID {:?} is not an integer", raw_id),
        )
    })?;

    let event = EventDocument {
        event_code: parse_int(&row.event_code),
        base_code: parse_int(&row.event_base_code),
        root_code: parse_int(&row.event_root_code),
        quad_class: parse_int(&row.quad_class).and_then(|v| QuadClass::try_from(v).ok()),
        goldstein_scale: parse_float(&row.goldstein_scale),
        num_mentions: parse_int(&row.num_mentions),
        num_sources: parse_int(&row.num_sources),
        num_articles: parse_int(&row.num_articles),
        avg_tone: parse_float(&row.avg_tone),
        date: parse_int(&row.day),
        year: parse_int(&row.year),
        month_year: parse_int(&row.month_year),
        fraction_date: text(&row.fraction_date),
        source: text(&row.source),
        ..EventDocument::new(event_id)
    };

    let actor = ActorDocument {
        type1_code: text(&row.actor1_type1_code),
        type2_code: text(&row.actor1_type2_code),
        type3_code: text(&row.actor1_type3_code),
        country_code: text(&row.actor1_country_code),
        ..ActorDocument::new(event_id)
    };

    let location = match (
        parse_float(&row.actor1_geo_lat),
        parse_float(&row.actor1_geo_long),
    ) {
        (Some(latitude), Some(longitude)) => Some(LocationDocument {
            geo_type: parse_int(&row.actor1_geo_type),
            fullname: text(&row.actor1_geo_fullname),
            country_code: text(&row.actor1_geo_country_code),
            adm1_code: text(&row.actor1_geo_adm1_code),
            adm2_code: text(&row.actor1_geo_adm2_code),
            latitude: Some(latitude),
            longitude: Some(longitude),
            feature_id: text(&row.actor1_geo_feature_id),
            ..LocationDocument::new(event_id)
        }),
        _ => None,
    };
    let occurred_at = location
        .as_ref()
        .map(|_| RelationDocument::occurred_at(event_id));

    Ok(GraphFragment {
        event_id,
        event,
        actor,
        location,
        has_actor: RelationDocument::has_actor(event_id),
        occurred_at,
    })
}
