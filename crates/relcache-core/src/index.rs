//! Local index records and their JSON sidecar store.
//!
//! Each resource directory carries a small `.index.json` file recording the
//! etag of the installed archive, origin metadata, expiry and the
//! last-checked / last-updated timestamps. Dates are stored as ISO-8601
//! strings.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name of the sidecar index inside a resource directory.
pub const INDEX_FILE_NAME: &str = ".index.json";

/// One artifact's entry in a remote manifest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Opaque version token.
    pub etag: String,

    /// Arbitrary origin metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,

    /// After this instant the local copy must be revalidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// When the artifact was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_date: Option<DateTime<Utc>>,
}

impl ManifestEntry {
    /// Creates an entry with only an etag.
    #[must_use]
    pub fn new(etag: impl Into<String>) -> Self {
        Self {
            etag: etag.into(),
            ..Default::default()
        }
    }
}

/// Cache metadata for one resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalIndex {
    /// Canonical resource id.
    #[serde(default)]
    pub id: String,

    /// Etag of the installed archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Origin metadata copied from the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,

    /// Expiry copied from the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// Build date copied from the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_date: Option<DateTime<Utc>>,

    /// Last time the origin was consulted (or the record rewritten).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,

    /// Last successful extraction. Absent means never installed.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl LocalIndex {
    /// Builds a record from a manifest entry, carrying `last_updated`.
    #[must_use]
    pub fn from_entry(entry: &ManifestEntry, last_updated: Option<DateTime<Utc>>) -> Self {
        Self {
            id: String::new(),
            etag: Some(entry.etag.clone()),
            meta: entry.meta.clone(),
            expires: entry.expires,
            build_date: entry.build_date,
            last_checked: None,
            last_updated,
        }
    }

    /// Returns true if contents were ever successfully extracted.
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.last_updated.is_some()
    }

    /// Returns true if the record is past its `expires` instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Returns true if the origin has not been consulted within `window`.
    #[must_use]
    pub fn needs_revalidation(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.last_checked
            .is_none_or(|checked| now.signed_duration_since(checked) > window)
    }

    /// Returns true if `entry` carries the installed etag.
    #[must_use]
    pub fn matches(&self, entry: &ManifestEntry) -> bool {
        self.etag.as_deref() == Some(entry.etag.as_str())
    }
}

/// Reads and writes the sidecar index of one resource directory.
#[derive(Debug, Clone)]
pub struct LocalIndexStore {
    id: String,
    path: PathBuf,
}

impl LocalIndexStore {
    /// Creates a store for the resource `id` cached in `resource_dir`.
    #[must_use]
    pub fn new(id: impl Into<String>, resource_dir: &Path) -> Self {
        Self {
            id: id.into(),
            path: resource_dir.join(INDEX_FILE_NAME),
        }
    }

    /// Returns the sidecar file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the index.
    ///
    /// Returns `None` when the file is missing or unreadable; never fails.
    #[must_use]
    pub fn read(&self) -> Option<LocalIndex> {
        match std::fs::read(&self.path) {
            Ok(bytes) => self.parse(&bytes),
            Err(e) => {
                self.log_read_error(&e);
                None
            }
        }
    }

    /// Async variant of [`read`](Self::read).
    pub async fn read_async(&self) -> Option<LocalIndex> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => self.parse(&bytes),
            Err(e) => {
                self.log_read_error(&e);
                None
            }
        }
    }

    /// Persists `index` with this store's id and a fresh `last_checked`.
    ///
    /// The resource directory is created if absent. The file is written to a
    /// temporary sibling and renamed into place; directory creation and the
    /// write are retried once together if the directory vanished in between.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, index: LocalIndex) -> Result<LocalIndex> {
        let index = self.stamp(index);
        let bytes = encode(&index)?;

        let mut attempt = 0;
        loop {
            match self.write_bytes(&bytes) {
                Ok(()) => return Ok(index),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && attempt == 0 => {
                    attempt += 1;
                    tracing::debug!(path = %self.path.display(), "Resource directory vanished, retrying write");
                }
                Err(e) => return Err(Error::io(&self.path, e)),
            }
        }
    }

    /// Async variant of [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn write_async(&self, index: LocalIndex) -> Result<LocalIndex> {
        let index = self.stamp(index);
        let bytes = encode(&index)?;

        let mut attempt = 0;
        loop {
            match self.write_bytes_async(&bytes).await {
                Ok(()) => return Ok(index),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && attempt == 0 => {
                    attempt += 1;
                    tracing::debug!(path = %self.path.display(), "Resource directory vanished, retrying write");
                }
                Err(e) => return Err(Error::io(&self.path, e)),
            }
        }
    }

    fn stamp(&self, mut index: LocalIndex) -> LocalIndex {
        index.id.clone_from(&self.id);
        index.last_checked = Some(Utc::now());
        index
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, &self.path)
    }

    async fn write_bytes_async(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await
    }

    fn parse(&self, bytes: &[u8]) -> Option<LocalIndex> {
        match serde_json::from_slice(bytes) {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable local index");
                None
            }
        }
    }

    fn log_read_error(&self, err: &std::io::Error) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to read local index");
        }
    }
}

fn encode(index: &LocalIndex) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(index)?;
    bytes.push(b'\n');
    Ok(bytes)
}
