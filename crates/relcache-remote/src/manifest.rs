//! Remote manifest documents and URL derivation.
//!
//! A release publishes, next to each `<artifact>.tar.gz`, a small JSON
//! manifest carrying the artifact's etag. Depending on the
//! [`ManifestLayout`] the manifest is either one document per artifact or a
//! single `index.json` keyed by artifact name.

use std::collections::HashMap;

use parking_lot::Mutex;
use relcache_core::{ManifestEntry, ResourceId};

use crate::config::{ManifestLayout, OriginConfig};
use crate::error::OriginError;

/// Aggregate manifest file name.
pub const AGGREGATE_INDEX: &str = "index.json";

/// The two remote locations derived from a resource id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrls {
    /// Manifest document URL.
    pub index: String,

    /// Archive URL.
    pub archive: String,
}

impl RemoteUrls {
    /// Derives the manifest and archive URLs for `id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use relcache_core::ResourceId;
    /// use relcache_remote::{ManifestLayout, OriginConfig, RemoteUrls};
    ///
    /// let id: ResourceId = "acme/geo/v1.0.0/cities".parse().unwrap();
    /// let urls = RemoteUrls::new(&OriginConfig::default(), &id);
    /// assert_eq!(
    ///     urls.index,
    ///     "https://github.com/acme/geo/releases/download/v1.0.0/cities.json"
    /// );
    /// assert_eq!(
    ///     urls.archive,
    ///     "https://github.com/acme/geo/releases/download/v1.0.0/cities.tar.gz"
    /// );
    ///
    /// let config = OriginConfig::default().with_layout(ManifestLayout::Aggregate);
    /// assert!(RemoteUrls::new(&config, &id).index.ends_with("/v1.0.0/index.json"));
    /// ```
    #[must_use]
    pub fn new(config: &OriginConfig, id: &ResourceId) -> Self {
        let base = config.release_url(id);
        let index = match config.layout {
            ManifestLayout::PerArtifact => format!("{base}/{}.json", id.name()),
            ManifestLayout::Aggregate => format!("{base}/{AGGREGATE_INDEX}"),
        };
        Self {
            index,
            archive: format!("{base}/{}.tar.gz", id.name()),
        }
    }
}

/// Extracts the entry for `artifact` from a fetched manifest document.
///
/// Returns `Ok(None)` when the document has no entry for the artifact.
///
/// # Errors
///
/// Returns [`OriginError::InvalidManifest`] if the entry exists but does not
/// have the expected shape.
pub fn manifest_entry(
    layout: ManifestLayout,
    document: &serde_json::Value,
    artifact: &str,
    url: &str,
) -> Result<Option<ManifestEntry>, OriginError> {
    let entry = match layout {
        // Per-artifact documents are the entry itself; tolerate a keyed
        // document published under the per-artifact name.
        ManifestLayout::PerArtifact if document.get("etag").is_some() => Some(document),
        ManifestLayout::PerArtifact | ManifestLayout::Aggregate => document.get(artifact),
    };

    let Some(entry) = entry.filter(|e| !e.is_null()) else {
        return Ok(None);
    };

    serde_json::from_value(entry.clone())
        .map(Some)
        .map_err(|e| OriginError::InvalidManifest {
            url: url.to_string(),
            message: e.to_string(),
        })
}

/// Manifest documents fetched during one batch, keyed by URL.
///
/// Resources sharing a release (same owner, collection and tag) reuse one
/// fetched aggregate manifest instead of requesting it per artifact.
#[derive(Debug, Default)]
pub struct ManifestCache {
    documents: Mutex<HashMap<String, serde_json::Value>>,
}

impl ManifestCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cached document.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<serde_json::Value> {
        self.documents.lock().get(url).cloned()
    }

    /// Stores a document.
    pub fn insert(&self, url: impl Into<String>, document: serde_json::Value) {
        self.documents.lock().insert(url.into(), document);
    }

    /// Returns the number of cached documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }
}
