//! Environment-driven settings for the GDELT indexer.

use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gdelt_indexer_repository::{ArangoConfig, GraphStoreSource};
use tracing::warn;

use crate::acquirer::AcquirerConfig;
use crate::cleaner::CleanerConfig;
use crate::materializer::{MaterializerConfig, DEFAULT_MAX_ROW_FAILURE_RATIO};
use crate::orchestrator::OrchestratorConfig;
use crate::IndexingError;

/// Default pointer file published by the feed.
const DEFAULT_LAST_UPDATE_URL: &str = "http://data.gdeltproject.org/gdeltv2/lastupdate.txt";

const DEFAULT_INPUT_DIR: &str = "data/input";
const DEFAULT_OUTPUT_DIR: &str = "data/output";
const DEFAULT_QUARANTINE_DIR: &str = "data/quarantine";

const DEFAULT_TICK_INTERVAL_SECS: u64 = 900;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Default ArangoDB URL.
const DEFAULT_ARANGO_URL: &str = "http://localhost:8529";
const DEFAULT_ARANGO_DATABASE: &str = "Gdelt_DB";
const DEFAULT_ARANGO_USERNAME: &str = "root";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

const DEFAULT_SERVER_PORT: u16 = 8000;

/// Connection mode for the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection every retry interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from `ARANGO_CONNECTION_MODE`.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    pub fn from_env() -> Self {
        match env::var("ARANGO_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid ARANGO_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Which graph store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Arango,
    Memory,
}

impl StoreBackend {
    /// Parse the backend from `GRAPH_STORE`; defaults to "arango".
    pub fn from_env() -> Self {
        match env::var("GRAPH_STORE")
            .unwrap_or_else(|_| "arango".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" | "in-memory" => Self::Memory,
            "arango" | "arangodb" => Self::Arango,
            _ => {
                warn!("Invalid GRAPH_STORE, defaulting to 'arango'");
                Self::Arango
            }
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console output.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse the format from `LOG_FORMAT`; anything but "json" is pretty.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Read a variable, falling back to `default` when unset.
fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse a variable, falling back to `default` with a warning when invalid.
fn env_parsed<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    variable = name,
                    value = %raw,
                    default = %default,
                    "Invalid value, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

/// Like [`env_parsed`], but zero also falls back to `default`.
fn env_nonzero(name: &str, default: u64) -> u64 {
    match env_parsed(name, default) {
        0 => {
            warn!(variable = name, default, "Zero is not allowed, using default");
            default
        }
        value => value,
    }
}

fn env_bool(name: &str) -> bool {
    matches!(
        env::var(name).unwrap_or_default().to_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// All runtime settings of the indexer.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub last_update_url: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub quarantine_dir: PathBuf,
    pub tick_interval: Duration,
    pub http_timeout: Duration,
    pub max_row_failure_ratio: f64,
    pub store_backend: StoreBackend,
    pub arango: ArangoConfig,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub server_host: IpAddr,
    pub server_port: u16,
    /// Run a single tick and exit.
    pub run_once: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            last_update_url: DEFAULT_LAST_UPDATE_URL.to_string(),
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            quarantine_dir: PathBuf::from(DEFAULT_QUARANTINE_DIR),
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_row_failure_ratio: DEFAULT_MAX_ROW_FAILURE_RATIO,
            store_backend: StoreBackend::Arango,
            arango: ArangoConfig::new(DEFAULT_ARANGO_URL, DEFAULT_ARANGO_DATABASE)
                .with_credentials(DEFAULT_ARANGO_USERNAME, ""),
            connection_mode: ConnectionMode::Retry,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            server_host: IpAddr::from([0, 0, 0, 0]),
            server_port: DEFAULT_SERVER_PORT,
            run_once: false,
        }
    }
}

impl IngestConfig {
    /// Load settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GDELT_LAST_UPDATE_URL`: Pointer file URL
    /// - `INPUT_DIR` / `OUTPUT_DIR` / `QUARANTINE_DIR`: Stage directories
    ///   (default: data/input, data/output, data/quarantine)
    /// - `TICK_INTERVAL_SECS`: Seconds between ticks (default: 900)
    /// - `HTTP_TIMEOUT_SECS`: Outbound request timeout (default: 120)
    /// - `MAX_ROW_FAILURE_RATIO`: Quarantine bound, 0 to 1 (default: 0.5)
    /// - `GRAPH_STORE`: "arango" or "memory" (default: arango)
    /// - `ARANGO_URL` / `ARANGO_DATABASE` / `ARANGO_USERNAME` / `ARANGO_PASSWORD`
    /// - `ARANGO_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `ARANGO_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `SERVER_HOST` / `SERVER_PORT`: REST bind address (default: 0.0.0.0:8000)
    /// - `RUN_ONCE`: Run one tick and exit (default: false)
    ///
    /// Invalid numbers fall back to their defaults; a ratio outside 0..=1 is
    /// an error.
    pub fn from_env() -> Result<Self, IndexingError> {
        let defaults = Self::default();

        let max_row_failure_ratio =
            env_parsed("MAX_ROW_FAILURE_RATIO", defaults.max_row_failure_ratio);
        if !(0.0..=1.0).contains(&max_row_failure_ratio) {
            return Err(IndexingError::config(format!(
                "MAX_ROW_FAILURE_RATIO must be between 0 and 1, got {}",
                max_row_failure_ratio
            )));
        }

        let http_timeout = Duration::from_secs(env_parsed(
            "HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        ));
        let arango = ArangoConfig::new(
            env_string("ARANGO_URL", DEFAULT_ARANGO_URL),
            env_string("ARANGO_DATABASE", DEFAULT_ARANGO_DATABASE),
        )
        .with_credentials(
            env_string("ARANGO_USERNAME", DEFAULT_ARANGO_USERNAME),
            env_string("ARANGO_PASSWORD", ""),
        );

        Ok(Self {
            last_update_url: env_string("GDELT_LAST_UPDATE_URL", DEFAULT_LAST_UPDATE_URL),
            input_dir: PathBuf::from(env_string("INPUT_DIR", DEFAULT_INPUT_DIR)),
            output_dir: PathBuf::from(env_string("OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            quarantine_dir: PathBuf::from(env_string("QUARANTINE_DIR", DEFAULT_QUARANTINE_DIR)),
            tick_interval: Duration::from_secs(env_nonzero(
                "TICK_INTERVAL_SECS",
                DEFAULT_TICK_INTERVAL_SECS,
            )),
            http_timeout,
            max_row_failure_ratio,
            store_backend: StoreBackend::from_env(),
            arango,
            connection_mode: ConnectionMode::from_env(),
            retry_interval: Duration::from_secs(env_parsed(
                "ARANGO_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )),
            server_host: env_parsed("SERVER_HOST", defaults.server_host),
            server_port: env_parsed("SERVER_PORT", DEFAULT_SERVER_PORT),
            run_once: env_bool("RUN_ONCE"),
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }

    /// Graph store backend selected by these settings.
    pub fn store_source(&self) -> GraphStoreSource {
        match self.store_backend {
            StoreBackend::Memory => GraphStoreSource::Memory,
            StoreBackend::Arango => GraphStoreSource::arango(self.arango.clone()),
        }
    }

    pub fn acquirer_config(&self) -> AcquirerConfig {
        AcquirerConfig {
            last_update_url: self.last_update_url.clone(),
            input_dir: self.input_dir.clone(),
            http_timeout: self.http_timeout,
        }
    }

    pub fn cleaner_config(&self) -> CleanerConfig {
        CleanerConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            quarantine_dir: self.quarantine_dir.clone(),
        }
    }

    pub fn materializer_config(&self) -> MaterializerConfig {
        MaterializerConfig {
            output_dir: self.output_dir.clone(),
            quarantine_dir: self.quarantine_dir.clone(),
            max_row_failure_ratio: self.max_row_failure_ratio,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            tick_interval: self.tick_interval,
        }
    }
}
