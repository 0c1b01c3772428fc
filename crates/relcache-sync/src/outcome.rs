//! Update outcomes and resource states.
//!
//! Outcomes carry HTTP-flavoured numeric codes for display and logging:
//! `200` updated, `304` not modified, `302` degraded but usable, `404`/`500`
//! fatal. Only the two fetches of the update protocol touch the network; the
//! codes themselves are internal signalling.

use serde::Serialize;

/// Result class of one resource update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// New contents were extracted.
    Updated,

    /// Local copy is current.
    NotModified,

    /// Origin check failed but the installed copy remains usable.
    Degraded,

    /// Origin has no entry for the artifact.
    NotFound,

    /// Origin, download, extraction or index write failed.
    Failed,
}

impl UpdateStatus {
    /// Returns the numeric result code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Updated => 200,
            Self::NotModified => 304,
            Self::Degraded => 302,
            Self::NotFound => 404,
            Self::Failed => 500,
        }
    }

    /// Returns true for hard success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Updated)
    }

    /// Returns true for outcomes that leave a usable copy without changes.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::NotModified | Self::Degraded)
    }

    /// Returns true for outcomes the caller must treat as failures.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound | Self::Failed)
    }

    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::NotModified => "not_modified",
            Self::Degraded => "degraded",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one resource update with an optional human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// Result class.
    pub status: UpdateStatus,

    /// Why the outcome happened, when it is not self-explanatory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UpdateOutcome {
    /// New contents were extracted.
    #[must_use]
    pub const fn updated() -> Self {
        Self {
            status: UpdateStatus::Updated,
            reason: None,
        }
    }

    /// Origin etag equals the installed one.
    #[must_use]
    pub const fn not_modified() -> Self {
        Self {
            status: UpdateStatus::NotModified,
            reason: None,
        }
    }

    /// Cached copy is within its revalidation window; origin not consulted.
    #[must_use]
    pub fn cache_valid() -> Self {
        Self {
            status: UpdateStatus::NotModified,
            reason: Some("cache valid".to_string()),
        }
    }

    /// Origin unusable, installed copy kept.
    #[must_use]
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            status: UpdateStatus::Degraded,
            reason: Some(reason.into()),
        }
    }

    /// Artifact missing from the origin.
    #[must_use]
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self {
            status: UpdateStatus::NotFound,
            reason: Some(reason.into()),
        }
    }

    /// Hard failure.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: UpdateStatus::Failed,
            reason: Some(reason.into()),
        }
    }

    /// Returns the numeric result code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.status.code()
    }

    /// See [`UpdateStatus::is_ok`].
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// See [`UpdateStatus::is_soft`].
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        self.status.is_soft()
    }

    /// See [`UpdateStatus::is_fatal`].
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.status.is_fatal()
    }

    /// Text shown in progress lines.
    #[must_use]
    pub fn status_text(&self) -> String {
        let label = match self.status {
            UpdateStatus::Updated => "Updated",
            UpdateStatus::NotModified => "Not modified",
            UpdateStatus::Degraded => "Degraded",
            UpdateStatus::NotFound => "Not found",
            UpdateStatus::Failed => "Failed",
        };
        match (&self.status, &self.reason) {
            (UpdateStatus::NotModified, Some(reason)) => format!("{label} ({reason})"),
            (_, Some(reason)) => format!("{label}: {reason}"),
            (_, None) => label.to_string(),
        }
    }
}

impl std::fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.status_text())
    }
}

/// Where a resource stands before an update runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Local index not loaded yet.
    Unchecked,

    /// Nothing installed.
    NotInstalled,

    /// Installed and within its revalidation window.
    InstalledFresh,

    /// Installed but expired or past its revalidation window.
    InstalledStale,
}

impl ResourceState {
    /// Returns true if a usable copy is on disk.
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        matches!(self, Self::InstalledFresh | Self::InstalledStale)
    }

    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::NotInstalled => "not_installed",
            Self::InstalledFresh => "installed_fresh",
            Self::InstalledStale => "installed_stale",
        }
    }
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
