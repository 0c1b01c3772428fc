//! Error types for the sync crate.
//!
//! Expected network and staleness conditions are not errors here: they come
//! back as an [`UpdateOutcome`](crate::UpdateOutcome). These variants cover
//! registration problems and the failures [`ResourceUnit::check`] escalates.
//!
//! [`ResourceUnit::check`]: crate::ResourceUnit::check

use relcache_remote::OriginError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while registering or checking resources.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The resource request could not be resolved.
    #[error(transparent)]
    Config(#[from] relcache_core::Error),

    /// The origin client could not be built.
    #[error("origin error: {0}")]
    Origin(#[from] OriginError),

    /// Installation was not permitted and nothing is installed.
    #[error("resource '{id}' is not installed")]
    NotInstalled {
        /// Canonical resource id.
        id: String,
    },

    /// An update ended in a fatal outcome.
    #[error("update of '{id}' failed ({status}): {reason}")]
    UpdateFailed {
        /// Canonical resource id.
        id: String,
        /// Numeric outcome code.
        status: u16,
        /// Failure reason.
        reason: String,
    },
}

impl SyncError {
    /// Returns true if this is a registration-time configuration problem.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
