//! In-memory origin and fixtures shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use relcache_core::{
    resolve, CacheRoots, HostInfo, ResolveContext, ResolvedResource, ResourceId, ResourceRequest,
};
use relcache_remote::{OriginConfig, OriginError, RemoteOrigin, RemoteUrls};

use crate::config::RegistryConfig;

pub const MOCK_ORIGIN: &str = "http://origin.test";

#[derive(Default)]
pub struct MockOrigin {
    manifests: Mutex<HashMap<String, serde_json::Value>>,
    archives: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    fail_manifests: AtomicBool,
    manifest_calls: AtomicUsize,
    archive_calls: AtomicUsize,
    on_archive: Mutex<Option<ArchiveHook>>,
}

type ArchiveHook = Box<dyn Fn() + Send + Sync>;

impl MockOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn urls(id: &str) -> RemoteUrls {
        let id: ResourceId = id.parse().unwrap();
        RemoteUrls::new(&OriginConfig::new(MOCK_ORIGIN), &id)
    }

    /// Publishes a per-artifact manifest and its archive.
    pub fn publish(&self, id: &str, manifest: serde_json::Value, archive: Vec<u8>) {
        let urls = Self::urls(id);
        self.manifests.lock().insert(urls.index, manifest);
        self.archives.lock().insert(urls.archive, archive);
    }

    pub fn publish_manifest_url(&self, url: &str, manifest: serde_json::Value) {
        self.manifests.lock().insert(url.to_string(), manifest);
    }

    pub fn publish_archive_url(&self, url: &str, archive: Vec<u8>) {
        self.archives.lock().insert(url.to_string(), archive);
    }

    /// Makes every request for `id` fail with a server error.
    pub fn fail(&self, id: &str) {
        let urls = Self::urls(id);
        let mut failing = self.failing.lock();
        failing.insert(urls.index);
        failing.insert(urls.archive);
    }

    pub fn fail_manifests(&self, fail: bool) {
        self.fail_manifests.store(fail, Ordering::SeqCst);
    }

    /// Runs `hook` whenever an archive is requested.
    pub fn on_archive(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_archive.lock() = Some(Box::new(hook));
    }

    pub fn manifest_calls(&self) -> usize {
        self.manifest_calls.load(Ordering::SeqCst)
    }

    pub fn archive_calls(&self) -> usize {
        self.archive_calls.load(Ordering::SeqCst)
    }

    fn check(&self, url: &str) -> Result<(), OriginError> {
        if self.failing.lock().contains(url) {
            return Err(OriginError::HttpError {
                status: 503,
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteOrigin for MockOrigin {
    async fn fetch_manifest(&self, url: &str) -> Result<serde_json::Value, OriginError> {
        self.manifest_calls.fetch_add(1, Ordering::SeqCst);
        self.check(url)?;
        if self.fail_manifests.load(Ordering::SeqCst) {
            return Err(OriginError::Timeout {
                url: url.to_string(),
            });
        }
        self.manifests
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| OriginError::HttpError {
                status: 404,
                url: url.to_string(),
            })
    }

    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>, OriginError> {
        self.archive_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &*self.on_archive.lock() {
            hook();
        }
        self.check(url)?;
        self.archives
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| OriginError::HttpError {
                status: 404,
                url: url.to_string(),
            })
    }
}

pub fn test_config(dir: &Path) -> RegistryConfig {
    RegistryConfig::builder()
        .origin(OriginConfig::new(MOCK_ORIGIN))
        .roots(CacheRoots::new(dir.join("cache")).with_package_dir("resources"))
        .host(HostInfo::new("linux", "x64"))
        .build()
}

pub fn resolved(config: &RegistryConfig, id: &str) -> ResolvedResource {
    let ctx = ResolveContext {
        caller_location: config.roots.global_root(),
        host: &config.host,
        roots: &config.roots,
    };
    resolve(&ResourceRequest::from(id), &ctx).unwrap()
}

pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Progress sink whose contents can be inspected after the writer moved.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
