//! Vertex document types for the event graph.
//!
//! This module defines the documents stored in the `Events`, `Actors` and
//! `Locations` collections. Field names follow the graph's camelCase
//! convention; absent or unparseable values are omitted rather than stored as
//! null.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key of the event vertex for a global event id.
pub fn event_key(event_id: i64) -> String {
    event_id.to_string()
}

/// Key of the actor vertex derived from a global event id.
pub fn actor_key(event_id: i64) -> String {
    format!("actor_{}", event_id)
}

/// Key of the location vertex derived from a global event id.
pub fn location_key(event_id: i64) -> String {
    format!("loc_{}", event_id)
}

/// Coarse event category, restricted to the four published classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadClass {
    VerbalCooperation,
    MaterialCooperation,
    VerbalConflict,
    MaterialConflict,
}

impl QuadClass {
    pub fn as_i64(&self) -> i64 {
        match self {
            QuadClass::VerbalCooperation => 1,
            QuadClass::MaterialCooperation => 2,
            QuadClass::VerbalConflict => 3,
            QuadClass::MaterialConflict => 4,
        }
    }
}

impl TryFrom<i64> for QuadClass {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(QuadClass::VerbalCooperation),
            2 => Ok(QuadClass::MaterialCooperation),
            3 => Ok(QuadClass::VerbalConflict),
            4 => Ok(QuadClass::MaterialConflict),
            other => Err(other),
        }
    }
}

impl Serialize for QuadClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for QuadClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        QuadClass::try_from(value).map_err(|v| {
            serde::de::Error::custom(format!("quad class must be 1-4, got {}", v))
        })
    }
}

/// Event vertex, keyed by the decimal global event id.
///
/// # Fields
///
/// - `key`: Decimal form of `GlobalEventID`
/// - `event_code`, `base_code`, `root_code`: CAMEO codes as integers
/// - `quad_class`: Coarse category, omitted when outside 1-4
/// - `goldstein_scale`, `avg_tone`: Floating point scores
/// - `date`, `year`, `month_year`: Calendar fields as integers
/// - `fraction_date`, `source`: Carried as text
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDocument {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quad_class: Option<QuadClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goldstein_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_mentions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_sources: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_articles: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_tone: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl EventDocument {
    /// Create an event vertex with every attribute absent.
    pub fn new(event_id: i64) -> Self {
        Self {
            key: event_key(event_id),
            ..Default::default()
        }
    }
}

/// Actor vertex, keyed `actor_<event id>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActorDocument {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "type1Code", skip_serializing_if = "Option::is_none")]
    pub type1_code: Option<String>,
    #[serde(rename = "type2Code", skip_serializing_if = "Option::is_none")]
    pub type2_code: Option<String>,
    #[serde(rename = "type3Code", skip_serializing_if = "Option::is_none")]
    pub type3_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl ActorDocument {
    pub fn new(event_id: i64) -> Self {
        Self {
            key: actor_key(event_id),
            ..Default::default()
        }
    }
}

/// Location vertex, keyed `loc_<event id>`.
///
/// `featureID` stays textual: the feed mixes numeric ids with ADM codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationDocument {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub geo_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(rename = "adm1Code", skip_serializing_if = "Option::is_none")]
    pub adm1_code: Option<String>,
    #[serde(rename = "adm2Code", skip_serializing_if = "Option::is_none")]
    pub adm2_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(rename = "featureID", skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
}

impl LocationDocument {
    pub fn new(event_id: i64) -> Self {
        Self {
            key: location_key(event_id),
            ..Default::default()
        }
    }
}
