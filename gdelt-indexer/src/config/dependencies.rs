//! Dependency initialization and wiring for the GDELT indexer.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use gdelt_indexer_repository::GraphStore;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::acquirer::Acquirer;
use crate::cleaner::Cleaner;
use crate::config::{ConnectionMode, IngestConfig};
use crate::materializer::Materializer;
use crate::orchestrator::{Orchestrator, PipelineStage};
use crate::server::{create_app, format_time_ago};
use crate::IndexingError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// REST router serving the graph.
    pub app: Router,
    /// Graph store shared by the materializer and the router.
    pub store: Arc<dyn GraphStore>,
}

impl Dependencies {
    /// Initialize all dependencies from `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast
    ///   mode for connection problems)
    pub async fn new(config: &IngestConfig) -> Result<Self, IndexingError> {
        let source = config.store_source();
        info!(
            graph_store = source.backend_name(),
            arango_url = %config.arango.url,
            arango_database = %config.arango.database,
            last_update_url = %config.last_update_url,
            input_dir = %config.input_dir.display(),
            output_dir = %config.output_dir.display(),
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            tick_interval_secs = config.tick_interval.as_secs(),
            "Initializing dependencies"
        );

        let store = source
            .into_store()
            .map_err(|e| IndexingError::config(format!("Failed to create graph store: {}", e)))?;

        Self::connect_to_store(store.as_ref(), config.connection_mode, config.retry_interval)
            .await?;
        info!("Graph store connection established");

        // Database and collections must exist before the first tick
        store
            .ensure_collections()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure collections: {}", e)))?;

        let acquirer = Acquirer::new(config.acquirer_config())
            .map_err(|e| IndexingError::config(format!("Failed to create acquirer: {}", e)))?;
        let cleaner = Cleaner::new(config.cleaner_config());
        let materializer = Materializer::new(Arc::clone(&store), config.materializer_config());

        let stages: Vec<Box<dyn PipelineStage>> =
            vec![Box::new(acquirer), Box::new(cleaner), Box::new(materializer)];
        let orchestrator = Orchestrator::with_config(stages, config.orchestrator_config());

        let app = create_app(Arc::clone(&store), format_time_ago(config.tick_interval));

        Ok(Self {
            orchestrator,
            app,
            store,
        })
    }

    /// Ping the store until it answers, according to the connection mode.
    async fn connect_to_store(
        store: &dyn GraphStore,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<(), IndexingError> {
        loop {
            match store.ping().await {
                Ok(()) => return Ok(()),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to graph store: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to graph store, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use gdelt_indexer_repository::ArangoConfig;
    use gdelt_indexer_shared::Collection;

    #[tokio::test]
    async fn test_memory_backend_wiring() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig {
            store_backend: StoreBackend::Memory,
            input_dir: dir.path().join("input"),
            output_dir: dir.path().join("output"),
            quarantine_dir: dir.path().join("quarantine"),
            ..IngestConfig::default()
        };

        let deps = Dependencies::new(&config).await.unwrap();

        assert_eq!(
            deps.orchestrator.stage_names(),
            vec!["acquirer", "cleaner", "materializer"]
        );
        assert_eq!(deps.store.count(Collection::Events).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fail_fast_on_unreachable_store() {
        let config = IngestConfig {
            store_backend: StoreBackend::Arango,
            arango: ArangoConfig::new("http://127.0.0.1:1", "Gdelt_DB")
                .with_timeout(Duration::from_secs(2)),
            connection_mode: ConnectionMode::FailFast,
            ..IngestConfig::default()
        };

        let result = Dependencies::new(&config).await;

        assert!(matches!(result, Err(IndexingError::ConfigError(_))));
    }
}
