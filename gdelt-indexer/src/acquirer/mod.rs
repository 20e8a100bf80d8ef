//! Acquirer stage.
//!
//! Polls the feed's pointer file, downloads the referenced archive and
//! extracts it into the input directory. A cycle is skipped when the
//! extracted file is already present; deduplication is by file name only.

mod archive;
mod pointer;

pub use archive::extract_archive;
pub use pointer::PointerRecord;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::errors::{AcquireError, IngestError};
use crate::orchestrator::{PipelineStage, StageReport};

/// Prefix of in-flight archive downloads inside the input directory.
pub const TEMP_PREFIX: &str = "temp_";

/// Configuration for the acquirer.
#[derive(Debug, Clone)]
pub struct AcquirerConfig {
    /// URL of the pointer file.
    pub last_update_url: String,
    /// Directory receiving extracted raw files.
    pub input_dir: PathBuf,
    /// Timeout applied to every outbound request.
    pub http_timeout: Duration,
}

/// Result of one acquisition cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The target file already exists in the input directory.
    Skipped { filename: String },
    /// The archive was downloaded and extracted.
    Downloaded {
        archive: String,
        extracted: Vec<String>,
    },
}

/// Downloads new feed archives into the input directory.
pub struct Acquirer {
    client: Client,
    config: AcquirerConfig,
}

impl Acquirer {
    /// Create a new acquirer with its own HTTP client.
    pub fn new(config: AcquirerConfig) -> Result<Self, AcquireError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AcquireError::http(&config.last_update_url, e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AcquirerConfig {
        &self.config
    }

    /// Run one acquisition cycle.
    #[instrument(skip(self, cancel), fields(pointer_url = %self.config.last_update_url))]
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<AcquireOutcome, AcquireError> {
        fs::create_dir_all(&self.config.input_dir).await?;

        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }
        let pointer = self.fetch_pointer().await?;
        let archive = pointer.archive_name()?;
        let target = pointer.target_filename()?;

        if fs::try_exists(self.config.input_dir.join(&target)).await? {
            info!(filename = %target, "File already acquired, skipping");
            return Ok(AcquireOutcome::Skipped { filename: target });
        }

        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }
        let temp_path = self
            .config
            .input_dir
            .join(format!("{}{}", TEMP_PREFIX, archive));

        let result = match self.download(&pointer.url, &temp_path).await {
            Ok(bytes) => {
                debug!(archive = %archive, bytes, expected = pointer.size, "Archive downloaded");
                let input_dir = self.config.input_dir.clone();
                let temp = temp_path.clone();
                tokio::task::spawn_blocking(move || extract_archive(&temp, &input_dir))
                    .await
                    .map_err(|e| AcquireError::archive(e.to_string()))
                    .and_then(|extracted| extracted)
            }
            Err(e) => Err(e),
        };

        remove_temp(&temp_path).await;

        let extracted = result?;
        info!(archive = %archive, files = ?extracted, "Archive extracted");
        Ok(AcquireOutcome::Downloaded { archive, extracted })
    }

    async fn fetch_pointer(&self) -> Result<PointerRecord, AcquireError> {
        let url = &self.config.last_update_url;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AcquireError::http(url, e))?;

        if !response.status().is_success() {
            return Err(AcquireError::HttpStatus {
                url: url.clone(),
                status: response.status().as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| AcquireError::http(url, e))?;
        PointerRecord::parse(&text)
    }

    /// Stream `url` into `path`, returning the number of bytes written.
    async fn download(&self, url: &str, path: &Path) -> Result<u64, AcquireError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AcquireError::http(url, e))?;

        if !response.status().is_success() {
            return Err(AcquireError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AcquireError::http(url, e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

async fn remove_temp(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary archive"),
    }
}

#[async_trait]
impl PipelineStage for Acquirer {
    fn name(&self) -> &'static str {
        "acquirer"
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<StageReport, IngestError> {
        Ok(StageReport::Acquired(self.acquire(cancel).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::SimpleFileOptions;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, content) in entries {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn acquirer(server: &MockServer, input_dir: &Path) -> Acquirer {
        Acquirer::new(AcquirerConfig {
            last_update_url: format!("{}/lastupdate.txt", server.uri()),
            input_dir: input_dir.to_path_buf(),
            http_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn mount_pointer(server: &MockServer, archive: &str) {
        let body = format!("12345 abcd1234 {}/{}\n", server.uri(), archive);
        Mock::given(method("GET"))
            .and(path("/lastupdate.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_downloads_and_extracts() {
        let server = MockServer::start().await;
        mount_pointer(&server, "20240101.export.CSV.zip").await;
        Mock::given(method("GET"))
            .and(path("/20240101.export.CSV.zip"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(zip_bytes(&[("20240101.export.CSV", "a\tb\tc\n")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let outcome = acquirer(&server, dir.path())
            .acquire(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AcquireOutcome::Downloaded {
                archive: "20240101.export.CSV.zip".to_string(),
                extracted: vec!["20240101.export.CSV".to_string()],
            }
        );
        let content = std::fs::read_to_string(dir.path().join("20240101.export.CSV")).unwrap();
        assert_eq!(content, "a\tb\tc\n");
        assert!(!dir.path().join("temp_20240101.export.CSV.zip").exists());
    }

    #[tokio::test]
    async fn test_skips_existing_file() {
        let server = MockServer::start().await;
        mount_pointer(&server, "20240101.export.CSV.zip").await;
        Mock::given(method("GET"))
            .and(path("/20240101.export.CSV.zip"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("20240101.export.CSV"), "already here").unwrap();

        let outcome = acquirer(&server, dir.path())
            .acquire(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AcquireOutcome::Skipped {
                filename: "20240101.export.CSV".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_pointer_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lastupdate.txt"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let err = acquirer(&server, dir.path())
            .acquire(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_malformed_pointer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lastupdate.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("garbage"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let err = acquirer(&server, dir.path())
            .acquire(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::MalformedPointer(_)));
    }

    #[tokio::test]
    async fn test_archive_missing_upstream() {
        let server = MockServer::start().await;
        mount_pointer(&server, "gone.CSV.zip").await;
        Mock::given(method("GET"))
            .and(path("/gone.CSV.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let err = acquirer(&server, dir.path())
            .acquire(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::HttpStatus { status: 404, .. }));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_archive_removes_temp_file() {
        let server = MockServer::start().await;
        mount_pointer(&server, "broken.CSV.zip").await;
        Mock::given(method("GET"))
            .and(path("/broken.CSV.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a zip".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let err = acquirer(&server, dir.path())
            .acquire(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::Archive(_)));
        assert!(!dir.path().join("temp_broken.CSV.zip").exists());
        assert!(!dir.path().join("broken.CSV").exists());
    }

    #[tokio::test]
    async fn test_cancelled_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = acquirer(&server, dir.path())
            .acquire(&cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::Cancelled));
    }
}
