//! Resource registry and sequential batch updates.
//!
//! The registry is an explicit context object: construct one at startup and
//! hand it to whatever registers resources. Units are keyed by canonical id
//! so repeated registrations return the same unit.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use relcache_core::{resolve, ResolveContext, ResolvedResource, ResourceRequest};
use relcache_remote::{ManifestCache, RemoteOrigin};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::event::ResourceEvent;
use crate::outcome::UpdateStatus;
use crate::report::{BatchEntry, BatchReport};
use crate::unit::{ResourceUnit, UpdateOptions};

/// Width of the fixed text around a name in a progress line.
const PROGRESS_PREFIX_WIDTH: usize = 26;

/// Options for a batch update.
///
/// The default consults the origin for every unit; set `remote` to false to
/// only revalidate expired or stale copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Consult the origin even for fresh copies.
    pub remote: bool,

    /// Treat any origin failure as fatal.
    pub force_remote: bool,

    /// Download even when etags match.
    pub ignore_etag: bool,

    /// Print a progress line for every unit.
    pub log: bool,

    /// Only process units with auto-update enabled, and only print lines for
    /// units whose outcome is not "not modified".
    pub auto_update_only: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            remote: true,
            force_remote: false,
            ignore_etag: false,
            log: false,
            auto_update_only: false,
        }
    }
}

impl BatchOptions {
    /// Enables per-unit progress lines.
    #[must_use]
    pub const fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Sets whether fresh copies are revalidated against the origin.
    #[must_use]
    pub const fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    const fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            remote: self.remote,
            force_remote: self.force_remote,
            ignore_etag: self.ignore_etag,
        }
    }
}

#[derive(Default)]
struct ResourceTable {
    order: Vec<Arc<ResourceUnit>>,
    by_id: HashMap<String, Arc<ResourceUnit>>,
}

/// Process-wide table of registered resources.
pub struct ResourceRegistry {
    pub(crate) config: RegistryConfig,
    origin: Arc<dyn RemoteOrigin>,
    table: RwLock<ResourceTable>,
    events: broadcast::Sender<ResourceEvent>,
    progress: Mutex<Box<dyn Write + Send>>,
    pub(crate) timer: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceRegistry {
    /// Creates a registry talking to the configured HTTP origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin URL is invalid.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let origin = config.create_origin()?;
        Ok(Self::with_origin(config, origin))
    }

    /// Creates a registry over an arbitrary origin transport.
    #[must_use]
    pub fn with_origin(config: RegistryConfig, origin: Arc<dyn RemoteOrigin>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            origin,
            table: RwLock::new(ResourceTable::default()),
            events,
            progress: Mutex::new(Box::new(std::io::stdout())),
            timer: Mutex::new(None),
        }
    }

    /// Redirects progress lines.
    #[must_use]
    pub fn with_progress_output(self, output: impl Write + Send + 'static) -> Self {
        *self.progress.lock() = Box::new(output);
        self
    }

    /// Returns the registry configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Resolves a request against this registry's roots and host.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the request cannot be resolved.
    pub fn resolve(
        &self,
        request: &ResourceRequest,
        caller_location: &Path,
    ) -> Result<ResolvedResource> {
        let ctx = ResolveContext {
            caller_location,
            host: &self.config.host,
            roots: &self.config.roots,
        };
        Ok(resolve(request, &ctx)?)
    }

    /// Registers a resource, returning the existing unit for a known id.
    ///
    /// `caller_location` is the registering module's path; it anchors the
    /// package root search for default tags and package-local caches.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the request cannot be resolved.
    pub fn add(
        &self,
        request: impl Into<ResourceRequest>,
        caller_location: &Path,
    ) -> Result<Arc<ResourceUnit>> {
        let resolved = self.resolve(&request.into(), caller_location)?;
        let key = resolved.id.to_string();

        let mut table = self.table.write();
        if let Some(unit) = table.by_id.get(&key) {
            debug!(id = %key, "Resource already registered");
            return Ok(Arc::clone(unit));
        }

        let unit = Arc::new(ResourceUnit::with_events(
            resolved,
            &self.config,
            Arc::clone(&self.origin),
            self.events.clone(),
        ));
        debug!(id = %key, location = %unit.location().display(), "Registered resource");
        table.by_id.insert(key, Arc::clone(&unit));
        table.order.push(Arc::clone(&unit));
        Ok(unit)
    }

    /// Returns the unit registered under a canonical id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<ResourceUnit>> {
        self.table.read().by_id.get(id).cloned()
    }

    /// Returns the unit a request resolves to, without registering it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the request cannot be resolved.
    pub fn find(
        &self,
        request: impl Into<ResourceRequest>,
        caller_location: &Path,
    ) -> Result<Option<Arc<ResourceUnit>>> {
        let resolved = self.resolve(&request.into(), caller_location)?;
        Ok(self.get(&resolved.id.to_string()))
    }

    /// Returns all units in registration order.
    #[must_use]
    pub fn units(&self) -> Vec<Arc<ResourceUnit>> {
        self.table.read().order.clone()
    }

    /// Returns the number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().order.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().order.is_empty()
    }

    /// Subscribes to change notifications from every registered unit.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.events.subscribe()
    }

    /// Reinstalls every unit from the origin, ignoring cached state.
    pub async fn install(&self, options: BatchOptions) -> BatchReport {
        self.run_batch(BatchOptions {
            remote: true,
            force_remote: true,
            ignore_etag: true,
            ..options
        })
        .await
    }

    /// Revalidates every unit by etag. See [`BatchOptions`] for the
    /// staleness-only mode.
    pub async fn update(&self, options: BatchOptions) -> BatchReport {
        self.run_batch(options).await
    }

    /// Updates units one at a time in registration order.
    pub(crate) async fn run_batch(&self, options: BatchOptions) -> BatchReport {
        let units: Vec<_> = self
            .units()
            .into_iter()
            .filter(|unit| !options.auto_update_only || unit.auto_update())
            .collect();

        let cache = ManifestCache::new();
        let pad = units.iter().map(|unit| unit.name().len()).max().unwrap_or(0);
        let mut entries = Vec::with_capacity(units.len());

        for unit in &units {
            if options.log {
                self.write_progress(&progress_header(unit.name(), pad));
            }
            let outcome = unit
                .update_with_cache(options.update_options(), Some(&cache))
                .await;

            if options.log {
                self.write_progress(&format!("{}\n", outcome.status_text()));
            } else if options.auto_update_only && outcome.status != UpdateStatus::NotModified {
                let line = progress_header(unit.name(), pad) + &outcome.status_text();
                self.write_progress(&format!("{line}\n"));
            }
            entries.push(BatchEntry {
                id: unit.to_string(),
                outcome,
            });
        }

        let report = BatchReport::from_entries(entries);
        if report.is_failed() {
            warn!(
                units = report.len(),
                failed = report.failed,
                degraded = report.degraded,
                "Batch update finished with failures"
            );
        } else {
            info!(
                units = report.len(),
                updated = report.updated,
                degraded = report.degraded,
                "Batch update finished"
            );
        }
        report
    }

    fn write_progress(&self, text: &str) {
        let mut output = self.progress.lock();
        if let Err(e) = output
            .write_all(text.as_bytes())
            .and_then(|()| output.flush())
        {
            debug!(error = %e, "Failed to write progress line");
        }
    }
}

/// Formats the start of a progress line, padded so that status texts line
/// up for names up to `pad` characters.
fn progress_header(name: &str, pad: usize) -> String {
    let header = format!("Updating resource \"{name}\" ... ");
    format!("{header:<width$}", width = pad + PROGRESS_PREFIX_WIDTH)
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("units", &self.len())
            .field("updating", &self.timer.lock().is_some())
            .finish_non_exhaustive()
    }
}
