//! Per-run accounting for the materializer.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::fragment::{FailureKind, RowFailure};

/// Failing rows kept verbatim in a report.
pub const MAX_FAILURE_EXAMPLES: usize = 5;

/// One failing row kept for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureExample {
    /// Zero-based data row index (header excluded).
    pub row_index: usize,
    pub kind: FailureKind,
    pub message: String,
    pub raw: String,
}

/// What happened to the canonical file after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Deleted,
    /// Failure ratio exceeded the threshold.
    Quarantined(PathBuf),
    /// The run was cancelled; the file stays for the next tick.
    Retained,
}

#[derive(Debug, Clone)]
pub struct MaterializeReport {
    pub source: PathBuf,
    pub total_rows: usize,
    pub succeeded_rows: usize,
    pub failed_rows: usize,
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
    pub examples: Vec<FailureExample>,
    pub vertices_written: usize,
    pub edges_written: usize,
    /// Vertices written by rows that then failed.
    pub vertices_left: usize,
    /// Edges written by rows that then failed.
    pub edges_left: usize,
    pub cancelled: bool,
    pub disposition: Disposition,
}

impl MaterializeReport {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            total_rows: 0,
            succeeded_rows: 0,
            failed_rows: 0,
            failures_by_kind: BTreeMap::new(),
            examples: Vec::new(),
            vertices_written: 0,
            edges_written: 0,
            vertices_left: 0,
            edges_left: 0,
            cancelled: false,
            disposition: Disposition::Retained,
        }
    }

    pub fn record_success(&mut self, vertices: usize, edges: usize) {
        self.succeeded_rows += 1;
        self.vertices_written += vertices;
        self.edges_written += edges;
    }

    pub fn record_failure(&mut self, row_index: usize, failure: RowFailure, raw: String) {
        self.failed_rows += 1;
        *self.failures_by_kind.entry(failure.kind).or_insert(0) += 1;
        self.vertices_left += failure.vertices_left;
        self.edges_left += failure.edges_left;
        if self.examples.len() < MAX_FAILURE_EXAMPLES {
            self.examples.push(FailureExample {
                row_index,
                kind: failure.kind,
                message: failure.message,
                raw,
            });
        }
    }

    /// Failed rows over processed rows; zero for an empty file.
    pub fn failure_ratio(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.failed_rows as f64 / self.total_rows as f64
        }
    }

    /// Whether the run failed badly enough to keep the source for inspection.
    pub fn exceeds(&self, max_failure_ratio: f64) -> bool {
        self.failure_ratio() > max_failure_ratio
    }

    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures_by_kind.get(&kind).copied().unwrap_or(0)
    }
}
