//! Configuration types for the resource registry.
//!
//! This module gathers the origin, cache root and host settings a registry
//! needs together with the revalidation window and auto-update period.

use std::sync::Arc;
use std::time::Duration;

use relcache_core::{CacheRoots, HostInfo};
use relcache_remote::{HttpOrigin, OriginConfig, RemoteOrigin};

use crate::error::Result;

/// Default revalidation window: the origin is consulted at least daily.
pub const DEFAULT_REVALIDATE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Default auto-update period.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

/// Default capacity of the change notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration for a [`ResourceRegistry`](crate::ResourceRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Origin client configuration.
    pub origin: OriginConfig,

    /// Cache roots.
    pub roots: CacheRoots,

    /// Host used for native artifact names.
    pub host: HostInfo,

    /// How long a checked copy stays fresh without consulting the origin.
    pub revalidate_after: Duration,

    /// Period of the auto-update timer.
    pub update_interval: Duration,

    /// Buffered events per subscriber before the slowest one lags.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            origin: OriginConfig::default(),
            roots: CacheRoots::default(),
            host: HostInfo::detect(),
            revalidate_after: DEFAULT_REVALIDATE_AFTER,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }

    /// Creates the HTTP origin client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin URL is invalid or the HTTP client
    /// cannot be built.
    pub fn create_origin(&self) -> Result<Arc<dyn RemoteOrigin>> {
        Ok(Arc::new(HttpOrigin::new(self.origin.clone())?))
    }

    /// Revalidation window as a signed duration for timestamp arithmetic.
    pub(crate) fn revalidation_window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.revalidate_after).unwrap_or(chrono::Duration::MAX)
    }
}

/// Builder for `RegistryConfig`.
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    origin: Option<OriginConfig>,
    roots: Option<CacheRoots>,
    host: Option<HostInfo>,
    revalidate_after: Option<Duration>,
    update_interval: Option<Duration>,
    event_capacity: Option<usize>,
}

impl RegistryConfigBuilder {
    /// Sets the origin configuration.
    #[must_use]
    pub fn origin(mut self, origin: OriginConfig) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Sets the cache roots.
    #[must_use]
    pub fn roots(mut self, roots: CacheRoots) -> Self {
        self.roots = Some(roots);
        self
    }

    /// Sets the host information.
    #[must_use]
    pub fn host(mut self, host: HostInfo) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the revalidation window.
    #[must_use]
    pub const fn revalidate_after(mut self, window: Duration) -> Self {
        self.revalidate_after = Some(window);
        self
    }

    /// Sets the auto-update period.
    #[must_use]
    pub const fn update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = Some(interval);
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub const fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> RegistryConfig {
        RegistryConfig {
            origin: self.origin.unwrap_or_default(),
            roots: self.roots.unwrap_or_default(),
            host: self.host.unwrap_or_else(HostInfo::detect),
            revalidate_after: self.revalidate_after.unwrap_or(DEFAULT_REVALIDATE_AFTER),
            update_interval: self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL),
            event_capacity: self
                .event_capacity
                .unwrap_or(DEFAULT_EVENT_CAPACITY)
                .max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.revalidate_after, Duration::from_secs(86_400));
        assert_eq!(config.update_interval, Duration::from_secs(14_400));
        assert_eq!(config.origin.url, "https://github.com");
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::builder()
            .origin(OriginConfig::new("http://localhost:9000"))
            .roots(CacheRoots::new("/tmp/relcache"))
            .host(HostInfo::new("linux", "x64"))
            .revalidate_after(Duration::from_secs(60))
            .update_interval(Duration::from_secs(5))
            .event_capacity(0)
            .build();

        assert_eq!(config.origin.url, "http://localhost:9000");
        assert_eq!(config.host.platform, "linux");
        assert_eq!(config.revalidate_after, Duration::from_secs(60));
        assert_eq!(config.update_interval, Duration::from_secs(5));
        assert_eq!(config.event_capacity, 1);
        assert_eq!(config.revalidation_window(), chrono::Duration::seconds(60));
    }

    #[test]
    fn test_create_origin_rejects_bad_url() {
        let config = RegistryConfig::builder()
            .origin(OriginConfig::new("not-a-url"))
            .build();
        assert!(config.create_origin().is_err());
    }
}
