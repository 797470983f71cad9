//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so that a failure log
//! line is enough to diagnose the problem without re-running.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur fetching a page or an image.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing an image.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The image source could not be turned into a fetchable URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Every candidate name was claimed by another writer first.
    #[error("no free filename for {name} after {attempts} attempts")]
    NameExhausted {
        /// The name that kept colliding.
        name: String,
        /// Number of exclusive-create attempts made.
        attempts: usize,
    },

    /// The worker task panicked or was cancelled.
    #[error("image #{index} task aborted: {message}")]
    TaskAborted {
        /// Zero-based element index.
        index: usize,
        /// Panic or cancellation message.
        message: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout or network error depending on the reqwest error kind.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a name-exhausted error.
    pub fn name_exhausted(name: impl Into<String>, attempts: usize) -> Self {
        Self::NameExhausted {
            name: name.into(),
            attempts,
        }
    }

    /// Creates a task-aborted error.
    pub fn task_aborted(index: usize, message: impl Into<String>) -> Self {
        Self::TaskAborted {
            index,
            message: message.into(),
        }
    }

    /// Returns whether this is a connection-level failure (connect error or timeout).
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Network { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the URL
// or path, which the source errors don't carry.
