//! Filesystem hand-off queue between stages.
//!
//! A file's presence in a directory is its pipeline state: raw files wait in
//! the input directory, canonical files in the output directory. Both the
//! cleaner and the materializer pick work oldest first by modification time,
//! with ties broken by file name.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;
use tracing::{debug, warn};

/// Regular files in `dir` whose name is accepted by `accept`, oldest first.
///
/// A missing directory yields an empty list.
pub async fn list_candidates<F>(dir: &Path, accept: F) -> io::Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut candidates: Vec<(SystemTime, String, PathBuf)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !accept(&name) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            // Removed between listing and stat
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, name, entry.path()));
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(candidates.into_iter().map(|(_, _, path)| path).collect())
}

/// The next file to process from `dir`, if any.
pub async fn select_next<F>(dir: &Path, accept: F) -> io::Result<Option<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let candidates = list_candidates(dir, accept).await?;
    if candidates.len() > 1 {
        debug!(dir = %dir.display(), pending = candidates.len(), "Multiple files queued");
    }
    Ok(candidates.into_iter().next())
}

/// Move `path` into `quarantine_dir`, creating the directory if needed.
///
/// An existing file of the same name is not overwritten; the moved file gets
/// a numeric suffix instead. Returns the new location.
pub async fn quarantine(path: &Path, quarantine_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(quarantine_dir).await?;

    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
        .to_string_lossy()
        .into_owned();

    let mut destination = quarantine_dir.join(&file_name);
    let mut suffix = 1;
    while fs::try_exists(&destination).await? {
        destination = quarantine_dir.join(format!("{}.{}", file_name, suffix));
        suffix += 1;
    }

    if let Err(e) = fs::rename(path, &destination).await {
        // Cross-device moves cannot be renames
        warn!(error = %e, from = %path.display(), "Rename failed, copying instead");
        fs::copy(path, &destination).await?;
        fs::remove_file(path).await?;
    }

    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, name).unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    fn is_csv(name: &str) -> bool {
        name.ends_with(".csv")
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_candidates(&missing, is_csv).await.unwrap().is_empty());
        assert!(select_next(&missing, is_csv).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oldest_first() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "new.csv", 10);
        touch(dir.path(), "old.csv", 300);
        touch(dir.path(), "mid.csv", 100);
        touch(dir.path(), "ignored.txt", 1000);

        let names: Vec<String> = list_candidates(dir.path(), is_csv)
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["old.csv", "mid.csv", "new.csv"]);
    }

    #[tokio::test]
    async fn test_ties_broken_by_name() {
        let dir = tempdir().unwrap();
        let stamp = SystemTime::now() - Duration::from_secs(60);
        for name in ["b.csv", "a.csv", "c.csv"] {
            let path = dir.path().join(name);
            std::fs::write(&path, name).unwrap();
            std::fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(stamp)
                .unwrap();
        }

        let next = select_next(dir.path(), is_csv).await.unwrap().unwrap();
        assert_eq!(next.file_name().unwrap(), "a.csv");
    }

    #[tokio::test]
    async fn test_directories_are_skipped() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();
        assert!(select_next(dir.path(), is_csv).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quarantine_moves_and_never_overwrites() {
        let dir = tempdir().unwrap();
        let quarantine_dir = dir.path().join("quarantine");

        let first = touch(dir.path(), "bad.csv", 0);
        let moved = quarantine(&first, &quarantine_dir).await.unwrap();
        assert_eq!(moved, quarantine_dir.join("bad.csv"));
        assert!(!first.exists());

        let second = touch(dir.path(), "bad.csv", 0);
        let moved_again = quarantine(&second, &quarantine_dir).await.unwrap();
        assert_eq!(moved_again, quarantine_dir.join("bad.csv.1"));
        assert!(moved.exists());
        assert!(moved_again.exists());
    }
}
