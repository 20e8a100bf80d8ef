//! A row of the canonical (cleaned) file, addressed by header name.

use serde::{Deserialize, Serialize};

/// Canonical row as read back by the materializer.
///
/// Every column is optional text; typing happens when the row is turned into
/// graph documents. Empty cells deserialize as `None` through the csv reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRow {
    #[serde(rename = "GlobalEventID")]
    pub global_event_id: Option<String>,
    #[serde(rename = "Day")]
    pub day: Option<String>,
    #[serde(rename = "MonthYear")]
    pub month_year: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "FractionDate")]
    pub fraction_date: Option<String>,
    #[serde(rename = "Actor1Type2Code")]
    pub actor1_type2_code: Option<String>,
    #[serde(rename = "Actor1Type1Code")]
    pub actor1_type1_code: Option<String>,
    #[serde(rename = "Actor1Type3Code")]
    pub actor1_type3_code: Option<String>,
    #[serde(rename = "Actor1CountryCode")]
    pub actor1_country_code: Option<String>,
    #[serde(rename = "IsRootEvent")]
    pub is_root_event: Option<String>,
    #[serde(rename = "EventCode")]
    pub event_code: Option<String>,
    #[serde(rename = "EventBaseCode")]
    pub event_base_code: Option<String>,
    #[serde(rename = "EventRootCode")]
    pub event_root_code: Option<String>,
    #[serde(rename = "QuadClass")]
    pub quad_class: Option<String>,
    #[serde(rename = "GoldsteinScale")]
    pub goldstein_scale: Option<String>,
    #[serde(rename = "NumMentions")]
    pub num_mentions: Option<String>,
    #[serde(rename = "NumSources")]
    pub num_sources: Option<String>,
    #[serde(rename = "NumArticles")]
    pub num_articles: Option<String>,
    #[serde(rename = "AvgTone")]
    pub avg_tone: Option<String>,
    #[serde(rename = "Actor1Geo_Type")]
    pub actor1_geo_type: Option<String>,
    #[serde(rename = "Actor1Geo_Fullname")]
    pub actor1_geo_fullname: Option<String>,
    #[serde(rename = "Actor1Geo_CountryCode")]
    pub actor1_geo_country_code: Option<String>,
    #[serde(rename = "Actor1Geo_ADM1Code")]
    pub actor1_geo_adm1_code: Option<String>,
    #[serde(rename = "Actor1Geo_ADM2Code")]
    pub actor1_geo_adm2_code: Option<String>,
    #[serde(rename = "Actor1Geo_Lat")]
    pub actor1_geo_lat: Option<String>,
    #[serde(rename = "Actor1Geo_Long")]
    pub actor1_geo_long: Option<String>,
    #[serde(rename = "Actor1Geo_FeatureID")]
    pub actor1_geo_feature_id: Option<String>,
    #[serde(rename = "Source")]
    pub source: Option<String>,
}
