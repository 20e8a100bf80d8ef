// App state for the Axum server
use std::sync::Arc;

use gdelt_indexer_repository::GraphStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GraphStore>,
    /// Freshness label attached to every served event.
    pub time_ago: Arc<str>,
}
