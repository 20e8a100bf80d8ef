//! GDELT Indexer Main Entry Point
//!
//! Runs the acquire, clean, materialize pipeline on a fixed tick and serves
//! the resulting event graph over HTTP.

use dotenv::dotenv;
use gdelt_indexer::config::LogFormat;
use gdelt_indexer::server::run_server;
use gdelt_indexer::{Dependencies, IndexingError, IngestConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing(format: LogFormat) -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gdelt_indexer=info,gdelt_indexer_repository=info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .try_init()
                .map_err(|e| IndexingError::config(e.to_string()))?;

            info!(
                service_name = "gdelt-indexer",
                service_version = env!("CARGO_PKG_VERSION"),
                "Tracing initialized with JSON format"
            );
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
                .try_init()
                .map_err(|e| IndexingError::config(e.to_string()))?;

            info!(
                service_name = "gdelt-indexer",
                service_version = env!("CARGO_PKG_VERSION"),
                "Tracing initialized with console output"
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing(LogFormat::from_env())?;

    info!("Starting GDELT indexer");

    let config = IngestConfig::from_env()?;

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    if config.run_once {
        let outcomes = deps.orchestrator.run_cycle().await;
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(stages_run = outcomes.len(), stages_failed = failed, "Single tick complete");
        return Ok(());
    }

    let addr = config.server_addr();
    let shutdown = deps.orchestrator.shutdown_token();
    let server_shutdown = shutdown.clone();
    let app = deps.app;
    let server = tokio::spawn(async move {
        if let Err(e) = run_server(app, addr, server_shutdown).await {
            error!(error = %e, "REST server failed");
        }
    });

    let result = deps.orchestrator.run().await;

    // The orchestrator may have stopped on its own; take the server down too
    shutdown.cancel();
    if let Err(e) = server.await {
        warn!(error = %e, "REST server task did not finish cleanly");
    }

    match result {
        Ok(()) => {
            info!("GDELT indexer stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "GDELT indexer failed");
            Err(e.into())
        }
    }
}
