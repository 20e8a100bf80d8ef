//! Cleaner stage.
//!
//! Converts one raw tab-delimited export file into a canonical comma-delimited
//! file holding only the mapped columns. The raw file is deleted on success,
//! kept on I/O failure, and quarantined when none of its rows match the column
//! map.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use gdelt_indexer_shared::schema::{canonical_header, project, MIN_RAW_FIELDS};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::acquirer::TEMP_PREFIX;
use crate::errors::{CleanError, IngestError};
use crate::orchestrator::{PipelineStage, StageReport};
use crate::queue;

/// Prefix of every canonical file name.
pub const CLEANED_PREFIX: &str = "cleaned_";

/// Suffix of canonical files that are still being written.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Maximum number of skipped rows kept as examples in a report.
const MAX_SKIPPED_EXAMPLES: usize = 5;

/// Whether a file in the input directory is a raw export ready for cleaning.
pub fn is_raw_candidate(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".csv") && !name.starts_with(TEMP_PREFIX)
}

/// Configuration for the cleaner.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub quarantine_dir: PathBuf,
}

/// A raw row that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// One-based line number in the raw file.
    pub line: u64,
    pub reason: String,
}

/// Outcome of cleaning one raw file.
#[derive(Debug, Clone)]
pub struct CleanReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rows_read: usize,
    pub rows_written: usize,
    pub rows_skipped: usize,
    /// First few skipped rows.
    pub examples: Vec<SkippedRow>,
}

impl CleanReport {
    fn skip(&mut self, line: u64, reason: String) {
        self.rows_skipped += 1;
        if self.examples.len() < MAX_SKIPPED_EXAMPLES {
            self.examples.push(SkippedRow { line, reason });
        }
    }
}

/// Cleans raw export files from the input directory.
pub struct Cleaner {
    config: CleanerConfig,
}

impl Cleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    /// Clean the oldest pending raw file, if any.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(report))` - A file was cleaned and its raw input deleted
    /// * `Ok(None)` - Nothing to do
    /// * `Err(CleanError::SchemaMismatch)` - The raw file was quarantined
    /// * `Err(CleanError)` - The raw file was left in place for a retry
    #[instrument(skip(self, cancel), fields(input_dir = %self.config.input_dir.display()))]
    pub async fn clean_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<CleanReport>, CleanError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let Some(source) = queue::select_next(&self.config.input_dir, is_raw_candidate).await?
        else {
            debug!("No raw files to clean");
            return Ok(None);
        };

        fs::create_dir_all(&self.config.output_dir).await?;
        let raw_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = self.config.output_dir.join(format!(
            "{}{}_{}",
            CLEANED_PREFIX,
            Utc::now().format("%Y-%m-%d_%H-%M-%S"),
            raw_name
        ));

        info!(source = %source.display(), "Cleaning raw file");
        let task_source = source.clone();
        let task_output = output.clone();
        let result = tokio::task::spawn_blocking(move || clean_file(&task_source, &task_output))
            .await
            .map_err(|e| CleanError::Task(e.to_string()))?;

        match result {
            Ok(report) => {
                fs::remove_file(&source).await?;
                info!(
                    source = %source.display(),
                    output = %report.output.display(),
                    rows_read = report.rows_read,
                    rows_written = report.rows_written,
                    rows_skipped = report.rows_skipped,
                    "Raw file cleaned"
                );
                Ok(Some(report))
            }
            Err(err) if err.is_schema_mismatch() => {
                let moved = queue::quarantine(&source, &self.config.quarantine_dir).await?;
                error!(
                    error = %err,
                    quarantined = %moved.display(),
                    "Raw file does not match the column map"
                );
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, source = %source.display(), "Cleaning failed, raw file kept");
                Err(err)
            }
        }
    }
}

/// Convert `source` into the canonical file at `output`.
///
/// Every row must carry exactly [`MIN_RAW_FIELDS`] fields; rows of any other
/// width are skipped. A file in which no row fits is a schema mismatch.
/// Nothing is left at `output` unless the whole file was converted.
///
/// Blocking; call from `spawn_blocking`.
pub fn clean_file(source: &Path, output: &Path) -> Result<CleanReport, CleanError> {
    let mut partial_name = output.as_os_str().to_owned();
    partial_name.push(PARTIAL_SUFFIX);
    let partial = PathBuf::from(partial_name);

    let result = write_canonical(source, &partial).and_then(|mut report| {
        std::fs::rename(&partial, output)?;
        report.output = output.to_path_buf();
        Ok(report)
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

fn write_canonical(source: &Path, partial: &Path) -> Result<CleanReport, CleanError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(source)?;
    let mut writer = WriterBuilder::new().from_path(partial)?;
    writer.write_record(canonical_header())?;

    let mut report = CleanReport {
        source: source.to_path_buf(),
        output: partial.to_path_buf(),
        rows_read: 0,
        rows_written: 0,
        rows_skipped: 0,
        examples: Vec::new(),
    };
    // Width of the first record, reported when no row fits the map
    let mut first_width: Option<usize> = None;
    let mut record = StringRecord::new();

    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                // The reader resumes at the next line
                report.rows_read += 1;
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                report.skip(line, e.to_string());
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        report.rows_read += 1;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let width = record.len();
        first_width.get_or_insert(width);

        if width != MIN_RAW_FIELDS {
            report.skip(
                line,
                format!("expected {} fields, found {}", MIN_RAW_FIELDS, width),
            );
            continue;
        }

        let fields: Vec<&str> = record.iter().collect();
        match project(&fields) {
            Some(projected) => {
                writer.write_record(&projected)?;
                report.rows_written += 1;
            }
            None => report.skip(line, format!("only {} fields", width)),
        }
    }

    if report.rows_written == 0 {
        return Err(CleanError::SchemaMismatch {
            file: source.display().to_string(),
            expected: MIN_RAW_FIELDS,
            found: first_width.unwrap_or(0),
        });
    }

    writer.flush()?;
    Ok(report)
}

#[async_trait]
impl PipelineStage for Cleaner {
    fn name(&self) -> &'static str {
        "cleaner"
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<StageReport, IngestError> {
        match self.clean_next(cancel).await? {
            Some(report) => Ok(StageReport::Cleaned(report)),
            None => Ok(StageReport::Idle),
        }
    }
}
