//! Query-side projection of an event joined with its actor and location.

use serde::{Deserialize, Serialize};

/// One event that has an `OCCURRED_AT` location, as served by the REST API.
///
/// Field names match the payload consumed by the map front end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocatedEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goldsteinscore: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quadclass: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(rename = "countryCode", skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(rename = "actorCountryCode", skip_serializing_if = "Option::is_none")]
    pub actor_country_code: Option<String>,
    #[serde(rename = "actorFilter", skip_serializing_if = "Option::is_none")]
    pub actor_filter: Option<String>,
    /// `[latitude, longitude]`; either may be absent.
    pub coordinates: [Option<f64>; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_located_event_payload_names() {
        let event = LocatedEvent {
            source: Some("http://example.com".to_string()),
            goldsteinscore: Some(-2.0),
            quadclass: Some(3),
            fullname: Some("Kyiv, Ukraine".to_string()),
            country_code: Some("UP".to_string()),
            actor_country_code: None,
            actor_filter: Some("GOV".to_string()),
            coordinates: [Some(50.45), Some(30.52)],
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["goldsteinscore"], -2.0);
        assert_eq!(value["countryCode"], "UP");
        assert_eq!(value["actorFilter"], "GOV");
        assert_eq!(value["coordinates"], json!([50.45, 30.52]));
        assert!(value.get("actorCountryCode").is_none());
    }
}
