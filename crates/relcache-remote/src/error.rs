//! Error types for remote origin operations.

use thiserror::Error;

/// Errors that make a remote origin unavailable for one request.
#[derive(Debug, Error)]
pub enum OriginError {
    /// Failed to connect to the origin.
    #[error("Failed to connect to origin at {url}: {source}")]
    ConnectionFailed {
        /// Request URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Request URL.
        url: String,
    },

    /// Origin answered with a non-success status.
    #[error("HTTP error from origin: {status} fetching {url}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// Manifest document is not valid JSON or has the wrong shape.
    #[error("Invalid manifest at {url}: {message}")]
    InvalidManifest {
        /// Manifest URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Response body could not be read.
    #[error("Failed to read response body from {url}: {message}")]
    Body {
        /// Request URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Origin base URL is not usable.
    #[error("Invalid origin URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// HTTP client could not be built.
    #[error("Failed to build HTTP client: {message}")]
    Client {
        /// Error message.
        message: String,
    },
}

impl OriginError {
    /// Returns the HTTP status if the origin answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the origin reported the document as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpError { status: 404, .. })
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_connect() {
            Self::ConnectionFailed {
                url: url.to_string(),
                source: err,
            }
        } else if let Some(status) = err.status() {
            Self::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else {
            Self::Body {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
