//! Configuration types for the remote origin client.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use relcache_core::ResourceId;
use serde::{Deserialize, Serialize};

use crate::error::OriginError;

/// Default origin hosting release downloads.
pub const DEFAULT_ORIGIN: &str = "https://github.com";

/// How an origin publishes artifact manifests for a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestLayout {
    /// One `<artifact>.json` document per artifact.
    #[default]
    PerArtifact,

    /// A single `index.json` keyed by artifact name.
    Aggregate,
}

impl ManifestLayout {
    /// Returns the configuration name of the layout.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerArtifact => "per-artifact",
            Self::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for ManifestLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-artifact" => Ok(Self::PerArtifact),
            "aggregate" => Ok(Self::Aggregate),
            other => Err(format!(
                "unknown manifest layout '{other}', expected 'per-artifact' or 'aggregate'"
            )),
        }
    }
}

/// Configuration for the remote origin client.
#[derive(Debug, Clone)]
pub struct OriginConfig {
    /// Origin base URL (e.g., "<https://github.com>").
    pub url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Manifest layout published by the origin.
    pub layout: ManifestLayout,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

impl OriginConfig {
    /// Creates a new origin configuration with the given base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use relcache_remote::OriginConfig;
    ///
    /// let config = OriginConfig::new("https://releases.example.com/");
    /// assert_eq!(config.url, "https://releases.example.com");
    /// ```
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(60),
            user_agent: format!("relcache/{}", env!("CARGO_PKG_VERSION")),
            layout: ManifestLayout::default(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the manifest layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: ManifestLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Checks that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::InvalidUrl`] otherwise.
    pub fn validate(&self) -> Result<(), OriginError> {
        let parsed = url::Url::parse(&self.url).map_err(|_| OriginError::InvalidUrl {
            url: self.url.clone(),
        })?;
        if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() {
            Ok(())
        } else {
            Err(OriginError::InvalidUrl {
                url: self.url.clone(),
            })
        }
    }

    /// Returns the release download directory for a resource.
    ///
    /// # Examples
    ///
    /// ```
    /// use relcache_core::ResourceId;
    /// use relcache_remote::OriginConfig;
    ///
    /// let id: ResourceId = "acme/geo/v1.0.0/cities".parse().unwrap();
    /// assert_eq!(
    ///     OriginConfig::default().release_url(&id),
    ///     "https://github.com/acme/geo/releases/download/v1.0.0"
    /// );
    /// ```
    #[must_use]
    pub fn release_url(&self, id: &ResourceId) -> String {
        format!(
            "{}/{}/{}/releases/download/{}",
            self.url,
            id.owner(),
            id.collection(),
            id.tag()
        )
    }
}
