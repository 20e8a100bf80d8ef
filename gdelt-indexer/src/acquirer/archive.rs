//! Zip extraction into the input directory.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::warn;

use crate::errors::AcquireError;

/// Extract every file entry of `archive` under `dest`.
///
/// Entries whose names would escape `dest` are skipped. Each file is written
/// under a `.partial` name and renamed once complete, so readers of `dest`
/// never see a half-written file. Returns the extracted relative paths.
///
/// Blocking; call from `spawn_blocking`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<Vec<String>, AcquireError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| AcquireError::archive(e.to_string()))?;

    let mut extracted = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| AcquireError::archive(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = %entry.name(), "Skipping archive entry with unsafe path");
            continue;
        };

        let out_path = dest.join(&relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut partial_name = out_path.as_os_str().to_owned();
        partial_name.push(".partial");
        let partial = Path::new(&partial_name);

        let written = File::create(partial).and_then(|mut out| io::copy(&mut entry, &mut out));
        if let Err(e) = written {
            let _ = fs::remove_file(partial);
            return Err(AcquireError::archive(format!(
                "failed to extract {}: {}",
                relative.display(),
                e
            )));
        }
        fs::rename(partial, &out_path)?;

        extracted.push(relative.to_string_lossy().into_owned());
    }

    if extracted.is_empty() {
        return Err(AcquireError::archive("archive contains no files"));
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extracts_all_files() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("bundle.zip");
        write_zip(&archive, &[("one.CSV", "1"), ("two.CSV", "22")]);
        let dest = dir.path().join("input");

        let extracted = extract_archive(&archive, &dest).unwrap();

        assert_eq!(extracted, vec!["one.CSV", "two.CSV"]);
        assert_eq!(fs::read_to_string(dest.join("two.CSV")).unwrap(), "22");
        let leftovers: Vec<_> = fs::read_dir(&dest)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_empty_archive_is_an_error() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("empty.zip");
        write_zip(&archive, &[]);

        let err = extract_archive(&archive, dir.path()).unwrap_err();
        assert!(matches!(err, AcquireError::Archive(_)));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("bogus.zip");
        fs::write(&archive, "plain text").unwrap();

        assert!(matches!(
            extract_archive(&archive, dir.path()),
            Err(AcquireError::Archive(_))
        ));
    }
}
