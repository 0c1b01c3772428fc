//! Error types for relcache core operations.
//!
//! Everything in this module is a configuration-class or local I/O failure.
//! Remote availability problems live in `relcache-remote`.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in relcache core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No package manifest was found walking up from the caller location.
    #[error("Unable to find package root starting from {start}")]
    PackageRootNotFound {
        /// Directory the search started from.
        start: PathBuf,
    },

    /// A package manifest was found but declares no version.
    #[error("Package manifest {manifest} does not declare a version")]
    MissingVersion {
        /// Path to the manifest file.
        manifest: PathBuf,
    },

    /// Resource identifier is malformed.
    #[error("Invalid resource id '{id}': {reason}")]
    InvalidIdentifier {
        /// Raw identifier.
        id: String,
        /// Reason the identifier was rejected.
        reason: String,
    },

    /// Neither an artifact name nor a native build kind was supplied.
    #[error("Resource '{id}' needs an artifact name or a native build kind")]
    MissingArtifact {
        /// Partially resolved identifier.
        id: String,
    },

    /// Native build kind requested but no ABI version is known for it.
    #[error("No ABI version configured for native kind '{kind}'")]
    MissingAbiVersion {
        /// Native kind name.
        kind: String,
    },

    /// Unknown cache location name.
    #[error("Invalid location '{value}', expected 'global' or 'package'")]
    InvalidLocation {
        /// Rejected value.
        value: String,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be extracted.
    #[error("Failed to extract archive into {path}: {source}")]
    Extraction {
        /// Destination directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Package manifest could not be parsed.
    #[error("Failed to parse package manifest {path}: {reason}")]
    ManifestParse {
        /// Manifest path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for errors raised while resolving a registration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::PackageRootNotFound { .. }
                | Self::MissingVersion { .. }
                | Self::InvalidIdentifier { .. }
                | Self::MissingArtifact { .. }
                | Self::MissingAbiVersion { .. }
                | Self::InvalidLocation { .. }
                | Self::ManifestParse { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_package_root() {
        let err = Error::PackageRootNotFound {
            start: PathBuf::from("/tmp/app"),
        };
        assert_eq!(
            err.to_string(),
            "Unable to find package root starting from /tmp/app"
        );
    }

    #[test]
    fn test_error_display_invalid_location() {
        let err = Error::InvalidLocation {
            value: "elsewhere".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid location 'elsewhere', expected 'global' or 'package'"
        );
    }

    #[test]
    fn test_configuration_classification() {
        let err = Error::MissingArtifact {
            id: "acme/tools/v1.0.0".to_string(),
        };
        assert!(err.is_configuration());

        let err = Error::io("/tmp/x", std::io::Error::other("boom"));
        assert!(!err.is_configuration());
    }
}
