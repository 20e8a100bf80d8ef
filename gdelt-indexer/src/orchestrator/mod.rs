//! Orchestrator module for the GDELT ingest.
//!
//! Runs the acquirer, cleaner, and materializer in order on a fixed tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::acquirer::AcquireOutcome;
use crate::cleaner::CleanReport;
use crate::errors::IngestError;
use crate::materializer::MaterializeReport;

/// Default pause between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Result of one successful stage run.
#[derive(Debug)]
pub enum StageReport {
    Acquired(AcquireOutcome),
    Cleaned(CleanReport),
    Materialized(MaterializeReport),
    /// The stage found nothing to do.
    Idle,
}

/// One step of the pipeline, run once per tick.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the stage once. Implementations check `cancel` before long work.
    async fn run(&self, cancel: &CancellationToken) -> Result<StageReport, IngestError>;
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Time between the start of consecutive ticks.
    pub tick_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Outcome of one stage within a tick.
#[derive(Debug)]
pub struct StageOutcome {
    pub stage: &'static str,
    pub result: Result<StageReport, IngestError>,
}

impl StageOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Orchestrator that drives the pipeline stages.
///
/// The orchestrator:
/// - Runs every stage once per tick, in order
/// - Keeps going when a stage fails
/// - Handles shutdown signals
pub struct Orchestrator {
    stages: Vec<Box<dyn PipelineStage>>,
    config: OrchestratorConfig,
    shutdown: CancellationToken,
    /// Ticks completed since startup.
    total_cycles: Arc<AtomicU64>,
    /// Stage runs that returned an error since startup.
    total_stage_failures: Arc<AtomicU64>,
}

impl Orchestrator {
    /// Create a new orchestrator running `stages` in the given order.
    pub fn new(stages: Vec<Box<dyn PipelineStage>>) -> Self {
        Self::with_config(stages, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    ///
    /// A zero tick interval is replaced by [`DEFAULT_TICK_INTERVAL`].
    pub fn with_config(stages: Vec<Box<dyn PipelineStage>>, mut config: OrchestratorConfig) -> Self {
        if config.tick_interval.is_zero() {
            warn!(
                default_secs = DEFAULT_TICK_INTERVAL.as_secs(),
                "Zero tick interval, using default"
            );
            config.tick_interval = DEFAULT_TICK_INTERVAL;
        }
        Self {
            stages,
            config,
            shutdown: CancellationToken::new(),
            total_cycles: Arc::new(AtomicU64::new(0)),
            total_stage_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Names of the configured stages, in run order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run a single tick: every stage once, sequentially.
    ///
    /// A failing stage is logged and does not prevent later stages from
    /// running. Stops early only when shutdown has been requested.
    #[instrument(skip(self), fields(cycle = self.total_cycles.load(Ordering::Relaxed) + 1))]
    pub async fn run_cycle(&self) -> Vec<StageOutcome> {
        let mut outcomes = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if self.shutdown.is_cancelled() {
                debug!(stage = stage.name(), "Shutdown requested, skipping remaining stages");
                break;
            }

            let result = stage.run(&self.shutdown).await;
            match &result {
                Ok(StageReport::Idle) => debug!(stage = stage.name(), "Stage idle"),
                Ok(report) => debug!(stage = stage.name(), report = ?report, "Stage finished"),
                Err(e) => {
                    self.total_stage_failures.fetch_add(1, Ordering::Relaxed);
                    error!(stage = stage.name(), error = %e, "Stage failed");
                }
            }
            outcomes.push(StageOutcome {
                stage: stage.name(),
                result,
            });
        }

        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        outcomes
    }

    /// Run the orchestrator.
    ///
    /// Ticks immediately, then every `tick_interval`, until `shutdown` is
    /// called or Ctrl-C is received.
    #[instrument(skip(self), fields(tick_interval_secs = self.config.tick_interval.as_secs()))]
    pub async fn run(&self) -> Result<(), IngestError> {
        info!(stages = ?self.stage_names(), "Starting GDELT ingest orchestrator");

        let shutdown = self.shutdown.clone();
        let signal_handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
                shutdown.cancel();
            }
        });

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let outcomes = self.run_cycle().await;
                    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
                    info!(
                        stages_run = outcomes.len(),
                        stages_failed = failed,
                        "Tick complete"
                    );
                }
            }
        }

        signal_handle.abort();

        info!(
            total_cycles = self.total_cycles(),
            total_stage_failures = self.total_stage_failures(),
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Token cancelled on shutdown, for tasks that should stop alongside.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles.load(Ordering::Relaxed)
    }

    pub fn total_stage_failures(&self) -> u64 {
        self.total_stage_failures.load(Ordering::Relaxed)
    }
}
