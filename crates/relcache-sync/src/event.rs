//! Change notifications published after successful extractions.

use std::path::PathBuf;

use serde::Serialize;

/// Event published to subscribers of a unit or registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceEvent {
    /// New contents were extracted.
    Updated {
        /// Canonical resource id.
        id: String,
        /// Directory the contents were extracted into.
        location: PathBuf,
        /// Etag of the installed archive.
        etag: String,
    },
}

impl ResourceEvent {
    /// Returns the canonical id the event concerns.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Updated { id, .. } => id,
        }
    }
}
