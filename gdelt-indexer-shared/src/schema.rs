//! Column mapping for the GDELT event-export feed.
//!
//! The producer publishes tab-delimited rows with no header and 61 positional
//! fields. Only the positions listed in [`COLUMN_MAP`] are carried into the
//! canonical file, in table order; every other column is dropped.
//!
//! The table is checked at compile time: indexes must be strictly increasing,
//! which also makes the last entry the maximum index.

/// A raw column position projected onto a canonical column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Zero-based position in the raw export row.
    pub index: usize,
    /// Header name in the canonical file.
    pub name: &'static str,
}

const fn col(index: usize, name: &'static str) -> ColumnMapping {
    ColumnMapping { index, name }
}

/// Raw position to canonical name, in canonical output order.
pub const COLUMN_MAP: [ColumnMapping; 28] = [
    col(0, "GlobalEventID"),
    col(1, "Day"),
    col(2, "MonthYear"),
    col(3, "Year"),
    col(4, "FractionDate"),
    col(5, "Actor1Type2Code"),
    col(6, "Actor1Type1Code"),
    col(16, "Actor1Type3Code"),
    col(17, "Actor1CountryCode"),
    col(25, "IsRootEvent"),
    col(26, "EventCode"),
    col(27, "EventBaseCode"),
    col(28, "EventRootCode"),
    col(29, "QuadClass"),
    col(30, "GoldsteinScale"),
    col(31, "NumMentions"),
    col(32, "NumSources"),
    col(33, "NumArticles"),
    col(34, "AvgTone"),
    col(35, "Actor1Geo_Type"),
    col(36, "Actor1Geo_Fullname"),
    col(37, "Actor1Geo_CountryCode"),
    col(38, "Actor1Geo_ADM1Code"),
    col(39, "Actor1Geo_ADM2Code"),
    col(40, "Actor1Geo_Lat"),
    col(41, "Actor1Geo_Long"),
    col(42, "Actor1Geo_FeatureID"),
    col(60, "Source"),
];

const fn strictly_increasing(map: &[ColumnMapping]) -> bool {
    let mut i = 1;
    while i < map.len() {
        if map[i].index <= map[i - 1].index {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    strictly_increasing(&COLUMN_MAP),
    "COLUMN_MAP indexes must be strictly increasing"
);

/// Highest raw position referenced by the map.
pub const MAX_INDEX: usize = COLUMN_MAP[COLUMN_MAP.len() - 1].index;

/// Minimum number of fields a raw row must carry for the map to apply.
pub const MIN_RAW_FIELDS: usize = MAX_INDEX + 1;

/// Canonical header names in output order.
pub fn canonical_header() -> impl Iterator<Item = &'static str> {
    COLUMN_MAP.iter().map(|mapping| mapping.name)
}

/// Project a raw row onto the canonical columns.
///
/// Returns `None` when the row is too short for the map.
pub fn project<'a>(fields: &[&'a str]) -> Option<Vec<&'a str>> {
    if fields.len() < MIN_RAW_FIELDS {
        return None;
    }
    Some(COLUMN_MAP.iter().map(|mapping| fields[mapping.index]).collect())
}
