//! Parsing of the feed's `lastupdate.txt` pointer file.

use url::Url;

use crate::errors::AcquireError;

/// First line of the pointer file: `<size> <hash> <url>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerRecord {
    /// Archive size in bytes as published.
    pub size: u64,
    pub hash: String,
    pub url: String,
}

impl PointerRecord {
    /// Parse the first non-empty line of the pointer text.
    pub fn parse(text: &str) -> Result<Self, AcquireError> {
        let line = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| AcquireError::malformed_pointer("pointer file is empty"))?;

        let mut parts = line.split_whitespace();
        let (Some(size), Some(hash), Some(url)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AcquireError::malformed_pointer(format!(
                "expected `size hash url`, got {:?}",
                line
            )));
        };

        let size = size
            .parse::<u64>()
            .map_err(|_| AcquireError::malformed_pointer(format!("invalid size {:?}", size)))?;

        Ok(Self {
            size,
            hash: hash.to_string(),
            url: url.to_string(),
        })
    }

    /// Last path segment of the archive URL.
    pub fn archive_name(&self) -> Result<String, AcquireError> {
        let url = Url::parse(&self.url)
            .map_err(|e| AcquireError::malformed_pointer(format!("invalid url {}: {}", self.url, e)))?;

        let name = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .ok_or_else(|| {
                AcquireError::malformed_pointer(format!("no file name in url {}", self.url))
            })?;

        Ok(name.to_string())
    }

    /// Name of the extracted file: the archive name without its `.zip` suffix.
    pub fn target_filename(&self) -> Result<String, AcquireError> {
        let archive = self.archive_name()?;
        let lower = archive.to_ascii_lowercase();
        match lower.strip_suffix(".zip") {
            Some(stem) if !stem.is_empty() => Ok(archive[..stem.len()].to_string()),
            _ => Ok(archive),
        }
    }
}
