//! Resources file loading and registry construction.
//!
//! The resources file is YAML:
//!
//! ```yaml
//! origin: https://github.com
//! layout: per-artifact
//! cacheDir: .cache/relcache
//! updateIntervalSecs: 14400
//! resources:
//!   - acme/geo/v1.0.0/cities
//!   - id: acme/addon
//!     native:
//!       kind: napi
//!       version: "9"
//! ```
//!
//! Relative paths resolve against the file's directory, which also anchors
//! the package root search for default tags.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use relcache_core::{CacheRoots, ResourceRequest};
use relcache_remote::{ManifestLayout, OriginConfig, DEFAULT_ORIGIN};
use relcache_sync::{RegistryConfig, ResourceRegistry};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::commands::CommonArgs;

/// Contents of a resources file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourcesFile {
    /// Origin base URL.
    #[serde(default)]
    pub origin: Option<String>,

    /// Manifest layout.
    #[serde(default)]
    pub layout: Option<ManifestLayout>,

    /// Global cache directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Auto-update period in seconds.
    #[serde(default)]
    pub update_interval_secs: Option<u64>,

    /// Resources to register, in order.
    #[serde(default)]
    pub resources: Vec<ResourceRequest>,
}

impl ResourcesFile {
    /// Parses YAML content.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse resources file")
    }

    /// Loads a resources file; a missing file yields an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                Self::parse(&content).with_context(|| format!("in {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No resources file");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

/// A registry populated from a resources file.
pub struct Workspace {
    /// Registry holding every listed resource.
    pub registry: Arc<ResourceRegistry>,

    /// Location passed to registrations.
    pub anchor: PathBuf,
}

impl Workspace {
    /// Loads the resources file named by `common` and registers its entries.
    pub fn open(common: &CommonArgs) -> Result<Self> {
        let path = std::path::absolute(&common.config)
            .with_context(|| format!("Invalid path {}", common.config.display()))?;
        let file = ResourcesFile::load(&path)?;
        if file.resources.is_empty() {
            warn!(path = %path.display(), "No resources configured");
        }

        let base = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        let config = registry_config(common, &file, &base);
        let registry = Arc::new(
            ResourceRegistry::new(config).context("Failed to create resource registry")?,
        );

        for request in &file.resources {
            registry
                .add(request.clone(), &path)
                .with_context(|| format!("Invalid resource {}", describe(request)))?;
        }

        Ok(Self {
            registry,
            anchor: path,
        })
    }
}

/// Merges command-line overrides over the resources file.
fn registry_config(common: &CommonArgs, file: &ResourcesFile, base: &Path) -> RegistryConfig {
    let url = common
        .origin
        .clone()
        .or_else(|| file.origin.clone())
        .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
    let layout = common.layout.or(file.layout).unwrap_or_default();
    let origin = OriginConfig::new(url)
        .with_timeout(Duration::from_secs(common.timeout))
        .with_layout(layout);

    let roots = common
        .cache_dir
        .clone()
        .or_else(|| file.cache_dir.as_ref().map(|dir| base.join(dir)))
        .map_or_else(CacheRoots::default, CacheRoots::new);

    let mut builder = RegistryConfig::builder().origin(origin).roots(roots);
    if let Some(secs) = file.update_interval_secs {
        builder = builder.update_interval(Duration::from_secs(secs));
    }
    builder.build()
}

fn describe(request: &ResourceRequest) -> &str {
    match request {
        ResourceRequest::Id(id) => id,
        ResourceRequest::Spec(spec) => &spec.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use relcache_core::{LocationKind, NativeKind};
    use tempfile::TempDir;

    use crate::commands::Cli;

    fn common(args: &[&str]) -> CommonArgs {
        let mut argv = vec!["relcache"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::parse_from(argv).common
    }

    #[test]
    fn test_parse_resources_file() {
        let file = ResourcesFile::parse(
            r#"
origin: https://releases.example.com
layout: aggregate
updateIntervalSecs: 600
resources:
  - acme/geo/v1.0.0/cities
  - id: acme/addon
    location: global
    native:
      kind: napi
      version: "9"
"#,
        )
        .unwrap();

        assert_eq!(file.origin.as_deref(), Some("https://releases.example.com"));
        assert_eq!(file.layout, Some(ManifestLayout::Aggregate));
        assert_eq!(file.update_interval_secs, Some(600));
        assert_eq!(file.resources.len(), 2);
        assert_eq!(
            file.resources[0],
            ResourceRequest::Id("acme/geo/v1.0.0/cities".to_string())
        );
        match &file.resources[1] {
            ResourceRequest::Spec(spec) => {
                assert_eq!(spec.location, Some(LocationKind::Global));
                assert_eq!(spec.native.as_ref().unwrap().kind, NativeKind::Napi);
            }
            ResourceRequest::Id(_) => panic!("expected structured request"),
        }
    }

    #[test]
    fn test_parse_empty_and_unknown() {
        assert!(ResourcesFile::parse("").unwrap().resources.is_empty());
        assert!(ResourcesFile::parse("mirror: x\n").is_err());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = ResourcesFile::load(&dir.path().join("relcache.yaml")).unwrap();
        assert!(file.resources.is_empty());
    }

    #[test]
    fn test_overrides() {
        let file = ResourcesFile {
            origin: Some("https://file.example.com".to_string()),
            cache_dir: Some(PathBuf::from("cache")),
            ..ResourcesFile::default()
        };

        let config = registry_config(&common(&[]), &file, Path::new("/work"));
        assert_eq!(config.origin.url, "https://file.example.com");
        assert_eq!(config.roots.global, PathBuf::from("/work/cache"));

        let config = registry_config(
            &common(&["--origin", "http://localhost:8080", "--cache-dir", "/tmp/c"]),
            &file,
            Path::new("/work"),
        );
        assert_eq!(config.origin.url, "http://localhost:8080");
        assert_eq!(config.roots.global, PathBuf::from("/tmp/c"));
    }

    #[test]
    fn test_open_registers_resources() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relcache.yaml");
        std::fs::write(
            &path,
            "cacheDir: cache\nresources:\n  - acme/geo/v1.0.0/cities\n  - acme/geo/v1.0.0/rivers\n",
        )
        .unwrap();

        let workspace = Workspace::open(&common(&["--config", path.to_str().unwrap()])).unwrap();
        assert_eq!(workspace.registry.len(), 2);
        let unit = workspace.registry.get("acme/geo/v1.0.0/rivers").unwrap();
        assert!(unit.location().starts_with(dir.path().join("cache")));
    }
}
