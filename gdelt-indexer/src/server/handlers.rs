// HTTP request handlers
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use gdelt_indexer_shared::LocatedEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::server::state::AppState;

/// Query parameters of `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// A located event as served to the map front end.
#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: LocatedEvent,
    pub time_ago: String,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "GDELT indexer is running")
}

/// Events endpoint - every event with a known location
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    match state.store.located_events(query.limit).await {
        Ok(events) => {
            debug!(count = events.len(), limit = ?query.limit, "Serving located events");
            let views: Vec<EventView> = events
                .into_iter()
                .map(|event| EventView {
                    event,
                    time_ago: state.time_ago.to_string(),
                })
                .collect();
            (StatusCode::OK, Json(serde_json::json!(views)))
        }
        Err(e) => {
            error!(error = %e, "Failed to query located events");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}
