//! Materializer stage.
//!
//! Rebuilds the event graph from the oldest canonical file: the four
//! collections are truncated, then every row is turned into an event, an
//! actor, an optional location and their edges. Rows fail independently.

mod fragment;
mod report;

pub use fragment::{build_fragment, parse_float, parse_int, FailureKind, GraphFragment, RowFailure};
pub use report::{Disposition, FailureExample, MaterializeReport, MAX_FAILURE_EXAMPLES};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord};
use gdelt_indexer_repository::{GraphStore, GraphStoreError};
use gdelt_indexer_shared::{CanonicalRow, Collection};
use serde::Serialize;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::cleaner::{CLEANED_PREFIX, PARTIAL_SUFFIX};
use crate::errors::{IngestError, MaterializeError};
use crate::orchestrator::{PipelineStage, StageReport};
use crate::queue;

/// Default bound on `failed_rows / total_rows` before a file is quarantined.
pub const DEFAULT_MAX_ROW_FAILURE_RATIO: f64 = 0.5;

/// Whether a file in the output directory is a finished canonical file.
pub fn is_canonical_candidate(name: &str) -> bool {
    name.starts_with(CLEANED_PREFIX) && !name.ends_with(PARTIAL_SUFFIX)
}

/// Configuration for the materializer.
#[derive(Debug, Clone)]
pub struct MaterializerConfig {
    pub output_dir: PathBuf,
    pub quarantine_dir: PathBuf,
    pub max_row_failure_ratio: f64,
}

/// Writes canonical files into the graph store.
pub struct Materializer {
    store: Arc<dyn GraphStore>,
    config: MaterializerConfig,
}

impl Materializer {
    pub fn new(store: Arc<dyn GraphStore>, config: MaterializerConfig) -> Self {
        Self { store, config }
    }

    /// Materialize the oldest pending canonical file, if any.
    ///
    /// A store failure before the row pass aborts the run and leaves the file
    /// in place. Row failures never abort the run.
    #[instrument(skip(self, cancel), fields(output_dir = %self.config.output_dir.display()))]
    pub async fn materialize_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<MaterializeReport>, MaterializeError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let Some(source) =
            queue::select_next(&self.config.output_dir, is_canonical_candidate).await?
        else {
            debug!("No canonical files to materialize");
            return Ok(None);
        };

        let contents = fs::read(&source).await?;
        let mut reader = ReaderBuilder::new().from_reader(contents.as_slice());
        let headers = reader.headers()?.clone();

        info!(source = %source.display(), "Rebuilding event graph");
        self.store.ensure_collections().await?;
        self.store.truncate_all().await?;

        let mut report = MaterializeReport::new(source.clone());
        let mut record = StringRecord::new();
        let mut row_index = 0;
        loop {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    report.total_rows += 1;
                    let failure = RowFailure::new(FailureKind::Malformed, e.to_string());
                    self.log_failure(row_index, &failure, "");
                    report.record_failure(row_index, failure, String::new());
                    row_index += 1;
                    // Non-UTF-8 and ragged rows leave the reader usable
                    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                        break;
                    }
                    continue;
                }
            }
            report.total_rows += 1;

            match self.materialize_record(&record, &headers).await {
                Ok((vertices, edges)) => report.record_success(vertices, edges),
                Err(failure) => {
                    let raw = record.iter().collect::<Vec<_>>().join(",");
                    self.log_failure(row_index, &failure, &raw);
                    report.record_failure(row_index, failure, raw);
                }
            }
            row_index += 1;
        }

        report.disposition = self.dispose(&source, &report).await?;

        info!(
            source = %source.display(),
            total_rows = report.total_rows,
            succeeded_rows = report.succeeded_rows,
            failed_rows = report.failed_rows,
            failures = ?report.failures_by_kind,
            vertices = report.vertices_written,
            edges = report.edges_written,
            vertices_left = report.vertices_left,
            edges_left = report.edges_left,
            disposition = ?report.disposition,
            "Materialization finished"
        );
        Ok(Some(report))
    }

    fn log_failure(&self, row_index: usize, failure: &RowFailure, raw: &str) {
        warn!(
            row_index,
            kind = %failure.kind,
            message = %failure.message,
            vertices_left = failure.vertices_left,
            edges_left = failure.edges_left,
            raw = %raw,
            "Skipping row"
        );
    }

    async fn materialize_record(
        &self,
        record: &StringRecord,
        headers: &StringRecord,
    ) -> Result<(usize, usize), RowFailure> {
        let row: CanonicalRow = record
            .deserialize(Some(headers))
            .map_err(|e| RowFailure::new(FailureKind::Malformed, e.to_string()))?;
        let fragment = build_fragment(&row)?;
        self.write_fragment(&fragment).await
    }

    /// Insert a fragment: event, actor, then the location with its edge, then
    /// the actor edge. Returns the vertex and edge counts written.
    ///
    /// Inserts are not rolled back. A failure carries the counts of the
    /// documents already written for the row.
    async fn write_fragment(&self, fragment: &GraphFragment) -> Result<(usize, usize), RowFailure> {
        let mut vertices = 0;
        let mut edges = 0;

        let written = async {
            self.insert(Collection::Events, &fragment.event).await?;
            vertices += 1;
            self.insert(Collection::Actors, &fragment.actor).await?;
            vertices += 1;
            if let (Some(location), Some(occurred_at)) =
                (&fragment.location, &fragment.occurred_at)
            {
                self.insert(Collection::Locations, location).await?;
                vertices += 1;
                self.insert(Collection::EventRelations, occurred_at).await?;
                edges += 1;
            }
            self.insert(Collection::EventRelations, &fragment.has_actor)
                .await?;
            edges += 1;
            Ok::<_, RowFailure>(())
        }
        .await;

        match written {
            Ok(()) => Ok((vertices, edges)),
            Err(failure) => Err(failure.left_behind(vertices, edges)),
        }
    }

    async fn insert<T: Serialize + Sync>(
        &self,
        collection: Collection,
        document: &T,
    ) -> Result<(), RowFailure> {
        let value = serde_json::to_value(document)
            .map_err(|e| RowFailure::new(FailureKind::StoreWrite, e.to_string()))?;
        self.store
            .insert(collection, &value)
            .await
            .map_err(|e| match e {
                GraphStoreError::ConflictError(_) => {
                    RowFailure::new(FailureKind::Conflict, e.to_string())
                }
                other => RowFailure::new(FailureKind::StoreWrite, other.to_string()),
            })
    }

    async fn dispose(
        &self,
        source: &std::path::Path,
        report: &MaterializeReport,
    ) -> Result<Disposition, MaterializeError> {
        if report.cancelled {
            info!(source = %source.display(), "Run cancelled, keeping canonical file");
            return Ok(Disposition::Retained);
        }
        if report.exceeds(self.config.max_row_failure_ratio) {
            let moved = queue::quarantine(source, &self.config.quarantine_dir).await?;
            warn!(
                source = %source.display(),
                quarantined = %moved.display(),
                failure_ratio = report.failure_ratio(),
                max_failure_ratio = self.config.max_row_failure_ratio,
                "Row failure ratio exceeded, canonical file quarantined"
            );
            return Ok(Disposition::Quarantined(moved));
        }
        fs::remove_file(source).await?;
        Ok(Disposition::Deleted)
    }
}

#[async_trait]
impl PipelineStage for Materializer {
    fn name(&self) -> &'static str {
        "materializer"
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<StageReport, IngestError> {
        match self.materialize_next(cancel).await? {
            Some(report) => Ok(StageReport::Materialized(report)),
            None => Ok(StageReport::Idle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdelt_indexer_repository::MemoryGraphStore;
    use gdelt_indexer_shared::{canonical_header, LocatedEvent};
    use serde_json::Value;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Canonical CSV with the given `(column, value)` overrides per row.
    fn canonical_csv(rows: &[Vec<(&str, &str)>]) -> String {
        let header: Vec<&str> = canonical_header().collect();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&header).unwrap();
        for row in rows {
            let record: Vec<&str> = header
                .iter()
                .map(|name| {
                    row.iter()
                        .find(|(column, _)| column == name)
                        .map(|(_, value)| *value)
                        .unwrap_or("")
                })
                .collect();
            writer.write_record(&record).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    fn london(id: &'static str) -> Vec<(&'static str, &'static str)> {
        vec![
            ("GlobalEventID", id),
            ("EventCode", "020"),
            ("GoldsteinScale", "1.9"),
            ("Actor1Geo_Lat", "51.5"),
            ("Actor1Geo_Long", "-0.1"),
            ("Actor1Geo_Fullname", "London, UK"),
            ("Source", "http://news.example/london"),
        ]
    }

    fn write_canonical(dir: &Path, name: &str, rows: &[Vec<(&str, &str)>]) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, canonical_csv(rows)).unwrap();
        path
    }

    fn materializer(store: Arc<dyn GraphStore>, root: &Path) -> Materializer {
        Materializer::new(
            store,
            MaterializerConfig {
                output_dir: root.join("output"),
                quarantine_dir: root.join("quarantine"),
                max_row_failure_ratio: DEFAULT_MAX_ROW_FAILURE_RATIO,
            },
        )
    }

    async fn counts(store: &dyn GraphStore) -> [u64; 4] {
        let mut counts = [0; 4];
        for (i, collection) in Collection::ALL.into_iter().enumerate() {
            counts[i] = store.count(collection).await.unwrap();
        }
        counts
    }

    #[test]
    fn test_canonical_candidates() {
        assert!(is_canonical_candidate("cleaned_2024-01-01_00-00-00_x.CSV"));
        assert!(!is_canonical_candidate("cleaned_2024-01-01_00-00-00_x.CSV.partial"));
        assert!(!is_canonical_candidate("20240101.export.CSV"));
    }

    #[tokio::test]
    async fn test_materializes_row_with_location() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        let source = write_canonical(&dir.path().join("output"), "cleaned_a.CSV", &[london("500")]);

        let report = materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.total_rows, 1);
        assert_eq!(report.succeeded_rows, 1);
        assert_eq!(report.vertices_written, 3);
        assert_eq!(report.edges_written, 2);
        assert_eq!(report.disposition, Disposition::Deleted);
        assert!(!source.exists());

        let event = store.get(Collection::Events, "500").unwrap();
        assert_eq!(event["eventCode"], 20);
        assert_eq!(event["goldsteinScale"], 1.9);
        assert!(event.get("avgTone").is_none());
        assert!(store.get(Collection::Actors, "actor_500").is_some());
        assert!(store.get(Collection::Locations, "loc_500").is_some());

        let edges = store.documents(Collection::EventRelations);
        let pairs: Vec<(String, String, String)> = edges
            .iter()
            .map(|e| {
                (
                    e["_from"].as_str().unwrap().to_string(),
                    e["_to"].as_str().unwrap().to_string(),
                    e["type"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert!(pairs.contains(&(
            "Events/500".to_string(),
            "Actors/actor_500".to_string(),
            "HAS_ACTOR".to_string()
        )));
        assert!(pairs.contains(&(
            "Events/500".to_string(),
            "Locations/loc_500".to_string(),
            "OCCURRED_AT".to_string()
        )));

        let located: Vec<LocatedEvent> = store.located_events(None).await.unwrap();
        assert_eq!(located.len(), 1);
        assert_eq!(located[0].coordinates, [Some(51.5), Some(-0.1)]);
    }

    #[tokio::test]
    async fn test_row_without_latitude_has_no_location() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        let mut row = london("500");
        row.retain(|(column, _)| *column != "Actor1Geo_Lat");
        write_canonical(&dir.path().join("output"), "cleaned_a.CSV", &[row]);

        materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(counts(store.as_ref()).await, [1, 1, 0, 1]);
        let edge = &store.documents(Collection::EventRelations)[0];
        assert_eq!(edge["type"], "HAS_ACTOR");
    }

    #[tokio::test]
    async fn test_duplicate_row_fails_without_stopping_the_pass() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        write_canonical(
            &dir.path().join("output"),
            "cleaned_a.CSV",
            &[london("1"), london("1"), london("2"), london("3")],
        );

        let report = materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.succeeded_rows, 3);
        assert_eq!(report.failures_of(FailureKind::Conflict), 1);
        assert_eq!(report.examples[0].row_index, 1);
        assert!(report.examples[0].raw.starts_with("1,"));
        assert_eq!(report.disposition, Disposition::Deleted);
        assert_eq!(counts(store.as_ref()).await, [3, 3, 3, 6]);
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        let output = dir.path().join("output");
        let materializer = materializer(store.clone(), dir.path());
        let rows = [london("1"), london("2")];

        write_canonical(&output, "cleaned_a.CSV", &rows);
        materializer
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap();
        let first = counts(store.as_ref()).await;

        write_canonical(&output, "cleaned_b.CSV", &rows);
        materializer
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap();
        let second = counts(store.as_ref()).await;

        assert_eq!(first, [2, 2, 2, 4]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_high_failure_ratio_quarantines_source() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        let source = write_canonical(
            &dir.path().join("output"),
            "cleaned_bad.CSV",
            &[
                london("1"),
                vec![("GlobalEventID", "")],
                vec![("GlobalEventID", "x1")],
            ],
        );

        let report = materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.failures_of(FailureKind::MissingEventId), 1);
        assert_eq!(report.failures_of(FailureKind::InvalidEventId), 1);
        let quarantined = dir.path().join("quarantine").join("cleaned_bad.CSV");
        assert_eq!(report.disposition, Disposition::Quarantined(quarantined.clone()));
        assert!(!source.exists());
        assert!(quarantined.exists());
        // Good rows are still written
        assert_eq!(store.count(Collection::Events).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_truncates_previous_graph() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        store.ensure_collections().await.unwrap();
        store
            .insert(Collection::Events, &serde_json::json!({"_key": "stale"}))
            .await
            .unwrap();
        write_canonical(&dir.path().join("output"), "cleaned_a.CSV", &[london("7")]);

        materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap();

        assert!(store.get(Collection::Events, "stale").is_none());
        assert!(store.get(Collection::Events, "7").is_some());
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        let result = materializer(store, dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_file() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        let source = write_canonical(&dir.path().join("output"), "cleaned_a.CSV", &[london("1")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = materializer(store, dir.path())
            .materialize_next(&cancel)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(source.exists());
    }

    /// Store that fails truncation or inserts on demand.
    struct FlakyStore {
        inner: MemoryGraphStore,
        fail_truncate: bool,
        fail_location_inserts: bool,
        inserts: AtomicUsize,
    }

    impl FlakyStore {
        fn new(fail_truncate: bool, fail_location_inserts: bool) -> Self {
            Self {
                inner: MemoryGraphStore::new(),
                fail_truncate,
                fail_location_inserts,
                inserts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GraphStore for FlakyStore {
        async fn ping(&self) -> Result<(), GraphStoreError> {
            Ok(())
        }

        async fn ensure_collections(&self) -> Result<(), GraphStoreError> {
            self.inner.ensure_collections().await
        }

        async fn truncate(&self, collection: Collection) -> Result<(), GraphStoreError> {
            if self.fail_truncate {
                return Err(GraphStoreError::truncate("store offline"));
            }
            self.inner.truncate(collection).await
        }

        async fn insert(
            &self,
            collection: Collection,
            document: &Value,
        ) -> Result<(), GraphStoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.fail_location_inserts && collection == Collection::Locations {
                return Err(GraphStoreError::insert("disk full"));
            }
            self.inner.insert(collection, document).await
        }

        async fn count(&self, collection: Collection) -> Result<u64, GraphStoreError> {
            self.inner.count(collection).await
        }

        async fn located_events(
            &self,
            limit: Option<usize>,
        ) -> Result<Vec<LocatedEvent>, GraphStoreError> {
            self.inner.located_events(limit).await
        }
    }

    #[tokio::test]
    async fn test_store_failure_aborts_and_keeps_file() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FlakyStore::new(true, false));
        let source = write_canonical(&dir.path().join("output"), "cleaned_a.CSV", &[london("1")]);

        let err = materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, MaterializeError::Store(_)));
        assert!(source.exists());
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_write_failure_is_row_level() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FlakyStore::new(false, true));
        let mut no_location = london("2");
        no_location.retain(|(column, _)| *column != "Actor1Geo_Long");
        write_canonical(
            &dir.path().join("output"),
            "cleaned_a.CSV",
            &[london("1"), no_location],
        );

        let report = materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.failures_of(FailureKind::StoreWrite), 1);
        assert_eq!(report.succeeded_rows, 1);
        assert_eq!(report.disposition, Disposition::Deleted);
        assert!(store.inner.get(Collection::Events, "2").is_some());

        // Row 0 got its event and actor in before the location insert failed
        assert!(store.inner.get(Collection::Events, "1").is_some());
        assert_eq!(report.vertices_left, 2);
        assert_eq!(report.edges_left, 0);
        assert_eq!(report.examples[0].row_index, 0);
        assert!(report.examples[0]
            .message
            .ends_with("(left behind: 2 vertices, 0 edges)"));
    }

    #[tokio::test]
    async fn test_ragged_row_is_malformed_and_later_rows_load() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryGraphStore::new());
        let output = dir.path().join("output");
        let mut contents = canonical_csv(&[london("1")]);
        contents.push_str("2,020,too,short\n");
        contents.push_str(canonical_csv(&[london("3")]).lines().nth(1).unwrap());
        contents.push('\n');
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("cleaned_a.CSV"), contents).unwrap();

        let report = materializer(store.clone(), dir.path())
            .materialize_next(&CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.succeeded_rows, 2);
        assert_eq!(report.failures_of(FailureKind::Malformed), 1);
        assert_eq!(report.examples[0].row_index, 1);
        assert_eq!(report.vertices_left, 0);
        assert_eq!(report.disposition, Disposition::Deleted);
        assert!(store.get(Collection::Events, "1").is_some());
        assert!(store.get(Collection::Events, "2").is_none());
        assert!(store.get(Collection::Events, "3").is_some());
    }
}
