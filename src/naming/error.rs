//! Error types for the naming client.

use thiserror::Error;

/// Errors that can occur while asking the text-generation endpoint for a name.
///
/// None of these abort a run: the worker falls back to the URL-derived name.
#[derive(Debug, Error)]
pub enum NamingError {
    /// The endpoint answered with a non-2xx status.
    #[error("bad naming response: HTTP {status} from {url}: {body}")]
    BadResponse {
        /// The completion URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The endpoint could not be reached (DNS, connection refused, TLS, reset).
    #[error("naming unavailable at {url}: {source}")]
    Unavailable {
        /// The completion URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request or the stream timed out.
    #[error("naming request to {url} timed out")]
    Timeout {
        /// The completion URL.
        url: String,
    },

    /// The stream carried an explicit error event.
    #[error("naming stream error: {message}")]
    StreamError {
        /// The message embedded in the event.
        message: String,
    },

    /// A `data:` line did not hold valid JSON.
    #[error("malformed naming event {line:?}: {source}")]
    MalformedEvent {
        /// The offending line.
        line: String,
        /// The JSON parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A line grew past the limit without a newline.
    #[error("naming stream line exceeds {limit} bytes")]
    OversizedLine {
        /// The line length limit in bytes.
        limit: usize,
    },
}

impl NamingError {
    /// Creates a transport error, distinguishing timeouts.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Unavailable {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a bad-response error.
    pub fn bad_response(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::BadResponse {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates an in-stream error.
    pub fn stream_error(message: impl Into<String>) -> Self {
        Self::StreamError {
            message: message.into(),
        }
    }

    /// Returns the HTTP status for [`NamingError::BadResponse`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}
