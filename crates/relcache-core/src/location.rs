//! Cache root selection.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Where a resource's extracted contents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    /// Shared per-user cache root.
    Global,

    /// Inside the consuming package's own build tree.
    Package,
}

impl LocationKind {
    /// Returns the configuration name of the location.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Package => "package",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "package" => Ok(Self::Package),
            other => Err(Error::InvalidLocation {
                value: other.to_string(),
            }),
        }
    }
}

/// Cache roots for both location kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRoots {
    /// Global cache root (default: `<user data dir>/relcache/resources`).
    pub global: PathBuf,

    /// Directory joined to a package root for package-local caches
    /// (default: `target/external-resources`).
    pub package_dir: PathBuf,
}

impl Default for CacheRoots {
    fn default() -> Self {
        Self {
            global: default_global_root(),
            package_dir: PathBuf::from("target").join("external-resources"),
        }
    }
}

impl CacheRoots {
    /// Creates cache roots with the given global directory.
    #[must_use]
    pub fn new(global: impl Into<PathBuf>) -> Self {
        Self {
            global: global.into(),
            ..Default::default()
        }
    }

    /// Sets the package-local directory name.
    #[must_use]
    pub fn with_package_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.package_dir = dir.into();
        self
    }

    /// Returns the global cache root.
    #[must_use]
    pub fn global_root(&self) -> &Path {
        &self.global
    }

    /// Returns the package-local cache root for a package directory.
    #[must_use]
    pub fn package_root(&self, package_dir: &Path) -> PathBuf {
        package_dir.join(&self.package_dir)
    }
}

/// Default global cache directory.
fn default_global_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".relcache"))
        .join("relcache")
        .join("resources")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse() {
        assert_eq!("global".parse::<LocationKind>().unwrap(), LocationKind::Global);
        assert_eq!(
            "package".parse::<LocationKind>().unwrap(),
            LocationKind::Package
        );
        assert!(matches!(
            "remote".parse::<LocationKind>(),
            Err(Error::InvalidLocation { value }) if value == "remote"
        ));
    }

    #[test]
    fn test_location_serde() {
        let json = serde_json::to_string(&LocationKind::Package).unwrap();
        assert_eq!(json, "\"package\"");
    }

    #[test]
    fn test_package_root() {
        let roots = CacheRoots::new("/cache").with_package_dir("deps/res");
        assert_eq!(
            roots.package_root(Path::new("/work/app")),
            PathBuf::from("/work/app/deps/res")
        );
        assert_eq!(roots.global_root(), Path::new("/cache"));
    }
}
