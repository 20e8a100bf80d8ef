//! Error types for the acquirer stage.

use thiserror::Error;

/// Errors that can occur while fetching the pointer file or the archive.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Transport failure talking to the feed.
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// The feed answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The pointer file does not have the `size hash url` shape.
    #[error("Malformed pointer: {0}")]
    MalformedPointer(String),

    /// The downloaded archive could not be read or extracted.
    #[error("Archive error: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown was requested before the acquisition finished.
    #[error("Acquisition cancelled")]
    Cancelled,
}

impl AcquireError {
    pub fn http(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Http {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn malformed_pointer(msg: impl Into<String>) -> Self {
        Self::MalformedPointer(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }
}
