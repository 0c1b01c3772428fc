//! Resource units and the update protocol.
//!
//! A [`ResourceUnit`] owns one cached resource directory and its sidecar
//! index. [`ResourceUnit::update`] runs the conditional fetch:
//!
//! 1. Load the local index lazily.
//! 2. Skip the origin entirely when a copy is installed, not expired and
//!    checked within the revalidation window, unless the caller asks for a
//!    remote check.
//! 3. Fetch the manifest entry (through a batch cache when given one).
//! 4. On an unchanged etag, refresh the metadata and report not modified.
//! 5. Otherwise download and extract the archive, then persist the new
//!    record with a fresh `lastUpdated` and publish an event.
//!
//! Failures in steps 3 and 5 degrade to the installed copy when there is
//! one and the caller did not demand an authoritative answer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use relcache_core::{
    extract_tar_gz_async, LocalIndex, LocalIndexStore, LocationKind, ManifestEntry,
    ResolvedResource, ResourceId,
};
use relcache_remote::{
    manifest_entry, ManifestCache, ManifestLayout, OriginError, RemoteOrigin, RemoteUrls,
};
use serde::{Serialize, Serializer};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::config::RegistryConfig;
use crate::error::{Result, SyncError};
use crate::event::ResourceEvent;
use crate::outcome::{ResourceState, UpdateOutcome, UpdateStatus};

/// Options for [`ResourceUnit::update`].
///
/// The default consults the origin. [`cached`](Self::cached) only does so
/// when the installed copy is expired or past the revalidation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Consult the origin even if the cached copy is fresh.
    pub remote: bool,

    /// Treat any origin failure as fatal, even with a usable copy installed.
    pub force_remote: bool,

    /// Download even if the origin etag matches the installed one.
    pub ignore_etag: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self::remote()
    }
}

impl UpdateOptions {
    /// Options for a conditional remote check.
    #[must_use]
    pub const fn remote() -> Self {
        Self {
            remote: true,
            force_remote: false,
            ignore_etag: false,
        }
    }

    /// Options that trust a fresh cached copy without a network call.
    #[must_use]
    pub const fn cached() -> Self {
        Self {
            remote: false,
            force_remote: false,
            ignore_etag: false,
        }
    }

    /// Options for an authoritative reinstall.
    #[must_use]
    pub const fn install() -> Self {
        Self {
            remote: true,
            force_remote: true,
            ignore_etag: true,
        }
    }
}

/// Options for [`ResourceUnit::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Permit a first-time installation.
    pub install: bool,

    /// Consult the origin even if the cached copy is fresh.
    pub remote: bool,

    /// Treat any origin failure as fatal.
    pub force_remote: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            install: true,
            remote: false,
            force_remote: false,
        }
    }
}

#[derive(Debug, Clone)]
enum IndexSlot {
    Unloaded,
    Loaded(Option<LocalIndex>),
}

/// One registered resource.
pub struct ResourceUnit {
    id: ResourceId,
    canonical: String,
    location: PathBuf,
    location_kind: LocationKind,
    auto_update: bool,
    urls: RemoteUrls,
    layout: ManifestLayout,
    revalidate_after: chrono::Duration,
    store: LocalIndexStore,
    index: RwLock<IndexSlot>,
    origin: Arc<dyn RemoteOrigin>,
    events: broadcast::Sender<ResourceEvent>,
}

impl ResourceUnit {
    /// Creates a standalone unit with its own event channel.
    #[must_use]
    pub fn new(
        resolved: ResolvedResource,
        config: &RegistryConfig,
        origin: Arc<dyn RemoteOrigin>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self::with_events(resolved, config, origin, events)
    }

    /// Creates a unit publishing to a shared event channel.
    pub(crate) fn with_events(
        resolved: ResolvedResource,
        config: &RegistryConfig,
        origin: Arc<dyn RemoteOrigin>,
        events: broadcast::Sender<ResourceEvent>,
    ) -> Self {
        let ResolvedResource {
            id,
            location,
            location_kind,
            auto_update,
        } = resolved;
        let canonical = id.to_string();

        Self {
            urls: RemoteUrls::new(&config.origin, &id),
            layout: config.origin.layout,
            revalidate_after: config.revalidation_window(),
            store: LocalIndexStore::new(canonical.clone(), &location),
            index: RwLock::new(IndexSlot::Unloaded),
            id,
            canonical,
            location,
            location_kind,
            auto_update,
            origin,
            events,
        }
    }

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Returns the artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Returns the directory holding the extracted contents.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns which cache root the resource lives under.
    #[must_use]
    pub const fn location_kind(&self) -> LocationKind {
        self.location_kind
    }

    /// Returns true if the auto-update scheduler refreshes this resource.
    #[must_use]
    pub const fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Returns the manifest and archive URLs.
    #[must_use]
    pub const fn urls(&self) -> &RemoteUrls {
        &self.urls
    }

    /// Returns the sidecar index path.
    #[must_use]
    pub fn index_path(&self) -> &Path {
        self.store.path()
    }

    /// Subscribes to this unit's change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.events.subscribe()
    }

    /// Returns the local index, reading the sidecar on first use.
    #[must_use]
    pub fn local_index(&self) -> Option<LocalIndex> {
        if let Some(index) = self.cached_index() {
            return index;
        }
        let index = self.store.read();
        *self.index.write() = IndexSlot::Loaded(index.clone());
        index
    }

    /// Returns true if contents were ever successfully extracted.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.local_index().is_some_and(|index| index.is_installed())
    }

    /// Reports the protocol state without touching the filesystem.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        match &*self.index.read() {
            IndexSlot::Unloaded => ResourceState::Unchecked,
            IndexSlot::Loaded(index) => self.state_of(index.as_ref()),
        }
    }

    /// Forgets the loaded index so the next access rereads the sidecar.
    pub fn reload(&self) {
        *self.index.write() = IndexSlot::Unloaded;
    }

    fn state_of(&self, index: Option<&LocalIndex>) -> ResourceState {
        match index.filter(|index| index.is_installed()) {
            None => ResourceState::NotInstalled,
            Some(index) if self.is_stale(index) => ResourceState::InstalledStale,
            Some(_) => ResourceState::InstalledFresh,
        }
    }

    fn is_stale(&self, index: &LocalIndex) -> bool {
        let now = Utc::now();
        index.is_expired(now) || index.needs_revalidation(now, self.revalidate_after)
    }

    /// Runs the update protocol.
    ///
    /// Never fails: every network and filesystem problem is folded into the
    /// returned outcome.
    pub async fn update(&self, options: UpdateOptions) -> UpdateOutcome {
        self.update_with_cache(options, None).await
    }

    /// Runs the update protocol, reusing manifests fetched earlier in a batch.
    #[instrument(skip(self, cache), fields(id = %self.canonical))]
    pub async fn update_with_cache(
        &self,
        options: UpdateOptions,
        cache: Option<&ManifestCache>,
    ) -> UpdateOutcome {
        let local = self.load_index().await;
        let state = self.state_of(local.as_ref());

        let remote = options.remote || options.force_remote;
        if state == ResourceState::InstalledFresh && !remote {
            debug!("Cached copy within revalidation window");
            return UpdateOutcome::cache_valid();
        }

        debug!(state = %state, "Checking origin");
        let entry = match self.fetch_entry(cache).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                let failure = UpdateOutcome::not_found(format!(
                    "no manifest entry for '{}'",
                    self.id.name()
                ));
                return self.degrade_or_fail(local, options, failure).await;
            }
            Err(e) => return self.degrade_or_fail(local, options, origin_failure(&e)).await,
        };

        if let Some(prior) = local.as_ref().filter(|index| index.is_installed()) {
            if prior.matches(&entry) && !options.ignore_etag {
                let refreshed = LocalIndex::from_entry(&entry, prior.last_updated);
                return match self.persist(refreshed).await {
                    Ok(_) => {
                        debug!(etag = %entry.etag, "Etag unchanged");
                        UpdateOutcome::not_modified()
                    }
                    Err(e) => {
                        let failure = UpdateOutcome::failed(e.to_string());
                        self.degrade_or_fail(local, options, failure).await
                    }
                };
            }
        }

        debug!(etag = %entry.etag, url = %self.urls.archive, "Updating");
        if let Err(failure) = self.download(&entry).await {
            return self.degrade_or_fail(local, options, failure).await;
        }

        let record = LocalIndex::from_entry(&entry, Some(Utc::now()));
        if let Err(e) = self.persist(record).await {
            let failure = UpdateOutcome::failed(e.to_string());
            return self.degrade_or_fail(local, options, failure).await;
        }

        info!(etag = %entry.etag, location = %self.location.display(), "Resource updated");
        let event = ResourceEvent::Updated {
            id: self.canonical.clone(),
            location: self.location.clone(),
            etag: entry.etag,
        };
        if self.events.send(event).is_err() {
            debug!("No subscribers for update event");
        }

        UpdateOutcome::updated()
    }

    /// Convenience wrapper over [`update`](Self::update).
    ///
    /// A degraded outcome is logged and returned as success since the
    /// installed copy stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotInstalled`] if `install` is false and nothing
    /// is installed, and [`SyncError::UpdateFailed`] for fatal outcomes.
    pub async fn check(&self, options: CheckOptions) -> Result<UpdateOutcome> {
        let installed = self
            .load_index()
            .await
            .is_some_and(|index| index.is_installed());
        if !options.install && !installed {
            return Err(SyncError::NotInstalled {
                id: self.canonical.clone(),
            });
        }

        let outcome = self
            .update(UpdateOptions {
                remote: options.remote,
                force_remote: options.force_remote,
                ignore_etag: false,
            })
            .await;

        if outcome.is_fatal() {
            return Err(SyncError::UpdateFailed {
                id: self.canonical.clone(),
                status: outcome.code(),
                reason: outcome.status_text(),
            });
        }
        if outcome.status == UpdateStatus::Degraded {
            warn!(id = %self.canonical, reason = ?outcome.reason, "Using installed copy");
        }
        Ok(outcome)
    }

    fn cached_index(&self) -> Option<Option<LocalIndex>> {
        match &*self.index.read() {
            IndexSlot::Unloaded => None,
            IndexSlot::Loaded(index) => Some(index.clone()),
        }
    }

    async fn load_index(&self) -> Option<LocalIndex> {
        if let Some(index) = self.cached_index() {
            return index;
        }
        let index = self.store.read_async().await;
        *self.index.write() = IndexSlot::Loaded(index.clone());
        index
    }

    async fn persist(&self, index: LocalIndex) -> relcache_core::Result<LocalIndex> {
        let written = self.store.write_async(index).await?;
        *self.index.write() = IndexSlot::Loaded(Some(written.clone()));
        Ok(written)
    }

    async fn fetch_entry(
        &self,
        cache: Option<&ManifestCache>,
    ) -> std::result::Result<Option<ManifestEntry>, OriginError> {
        let url = &self.urls.index;
        let document = match cache.and_then(|cache| cache.get(url)) {
            Some(document) => document,
            None => {
                let document = self.origin.fetch_manifest(url).await?;
                if let Some(cache) = cache {
                    cache.insert(url.clone(), document.clone());
                }
                document
            }
        };
        manifest_entry(self.layout, &document, self.id.name(), url)
    }

    async fn download(&self, entry: &ManifestEntry) -> std::result::Result<usize, UpdateOutcome> {
        let bytes = self
            .origin
            .fetch_archive(&self.urls.archive)
            .await
            .map_err(|e| origin_failure(&e))?;

        extract_tar_gz_async(bytes, self.location.clone())
            .await
            .map_err(|e| {
                UpdateOutcome::failed(format!("extracting etag {}: {e}", entry.etag))
            })
    }

    /// Keeps a usable installed copy or surfaces `failure`.
    async fn degrade_or_fail(
        &self,
        local: Option<LocalIndex>,
        options: UpdateOptions,
        failure: UpdateOutcome,
    ) -> UpdateOutcome {
        let prior = local.filter(|index| index.is_installed());
        let Some(prior) = prior.filter(|_| !options.force_remote) else {
            warn!(id = %self.canonical, code = failure.code(), reason = ?failure.reason, "Update failed");
            return failure;
        };

        let reason = failure
            .reason
            .clone()
            .unwrap_or_else(|| failure.status_text());

        // Advance lastChecked on the prior record so the window resets.
        if let Err(e) = self.persist(prior).await {
            warn!(id = %self.canonical, error = %e, "Failed to persist local index");
        }

        warn!(id = %self.canonical, reason = %reason, "Origin unavailable, keeping installed copy");
        UpdateOutcome::degraded(reason)
    }
}

fn origin_failure(error: &OriginError) -> UpdateOutcome {
    if error.is_not_found() {
        UpdateOutcome::not_found(error.to_string())
    } else {
        UpdateOutcome::failed(error.to_string())
    }
}

impl fmt::Debug for ResourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceUnit")
            .field("id", &self.canonical)
            .field("location", &self.location)
            .field("location_kind", &self.location_kind)
            .field("auto_update", &self.auto_update)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ResourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Serialize for ResourceUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical)
    }
}
