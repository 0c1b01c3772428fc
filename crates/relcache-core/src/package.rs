//! Discovery of the consuming package's root directory and declared version.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Package manifests recognised while walking up from a caller location,
/// in lookup order within each directory.
pub const PACKAGE_MANIFESTS: [&str; 2] = ["Cargo.toml", "package.json"];

/// A package root and the manifest that marked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRoot {
    /// Directory containing the manifest.
    pub dir: PathBuf,

    /// Path to the manifest file.
    pub manifest: PathBuf,
}

impl PackageRoot {
    /// Returns the version declared by the package manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or parsed, or if it
    /// declares no version.
    pub fn version(&self) -> Result<String> {
        let content = std::fs::read_to_string(&self.manifest)
            .map_err(|e| Error::io(&self.manifest, e))?;

        let version = if self.manifest.extension().is_some_and(|ext| ext == "toml") {
            match cargo_version(&content).map_err(|reason| Error::ManifestParse {
                path: self.manifest.clone(),
                reason,
            })? {
                CargoVersion::Declared(version) => Some(version),
                CargoVersion::Inherited => inherited_version(&self.dir)?,
                CargoVersion::Missing => None,
            }
        } else {
            let value: serde_json::Value =
                serde_json::from_str(&content).map_err(|e| Error::ManifestParse {
                    path: self.manifest.clone(),
                    reason: e.to_string(),
                })?;
            value
                .get("version")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        };

        version
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::MissingVersion {
                manifest: self.manifest.clone(),
            })
    }

    /// Returns the default release tag for this package (`v<version>`).
    ///
    /// # Errors
    ///
    /// See [`version`](Self::version).
    pub fn default_tag(&self) -> Result<String> {
        Ok(format!("v{}", self.version()?))
    }
}

/// Walks parent directories from `start` until a package manifest is found.
///
/// `start` may point at a file (such as the registering source file); the
/// search then begins at its directory.
///
/// # Errors
///
/// Returns [`Error::PackageRootNotFound`] when the filesystem root is reached
/// without finding a manifest.
pub fn find_package_root(start: &Path) -> Result<PackageRoot> {
    let first = if start.is_file() {
        start.parent().unwrap_or(start)
    } else {
        start
    };

    for dir in first.ancestors() {
        for name in PACKAGE_MANIFESTS {
            let manifest = dir.join(name);
            if manifest.is_file() {
                tracing::debug!(root = %dir.display(), manifest = name, "Found package root");
                return Ok(PackageRoot {
                    dir: dir.to_path_buf(),
                    manifest,
                });
            }
        }
    }

    Err(Error::PackageRootNotFound {
        start: start.to_path_buf(),
    })
}

/// Version declared by one `Cargo.toml`.
#[derive(Debug, PartialEq, Eq)]
enum CargoVersion {
    Declared(String),
    /// `version.workspace = true`: the workspace root declares it.
    Inherited,
    Missing,
}

fn cargo_version(content: &str) -> std::result::Result<CargoVersion, String> {
    let table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;

    match table.get("package").and_then(|p| p.get("version")) {
        Some(toml::Value::String(version)) => return Ok(CargoVersion::Declared(version.clone())),
        Some(toml::Value::Table(inherit))
            if inherit.get("workspace").and_then(toml::Value::as_bool) == Some(true) =>
        {
            // A root package inherits from the workspace table beside it.
            return Ok(workspace_package_version(&table)
                .map_or(CargoVersion::Inherited, CargoVersion::Declared));
        }
        _ => {}
    }

    Ok(workspace_package_version(&table).map_or(CargoVersion::Missing, CargoVersion::Declared))
}

fn workspace_package_version(table: &toml::Table) -> Option<String> {
    table
        .get("workspace")
        .and_then(|w| w.get("package"))
        .and_then(|p| p.get("version"))
        .and_then(toml::Value::as_str)
        .map(String::from)
}

/// Reads `[workspace.package].version` from the nearest enclosing workspace
/// root above a member package directory.
fn inherited_version(member_dir: &Path) -> Result<Option<String>> {
    for dir in member_dir.ancestors().skip(1) {
        let manifest = dir.join("Cargo.toml");
        if !manifest.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&manifest).map_err(|e| Error::io(&manifest, e))?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| Error::ManifestParse {
            path: manifest.clone(),
            reason: e.to_string(),
        })?;
        if table.contains_key("workspace") {
            tracing::debug!(root = %dir.display(), "Using workspace package version");
            return Ok(workspace_package_version(&table));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_root_from_nested_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Cargo.toml"),
            "[package]\nname = \"app\"\nversion = \"1.4.2\"\n",
        )
        .unwrap();
        let nested = temp.path().join("src/bin");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_package_root(&nested).unwrap();
        assert_eq!(root.dir, temp.path());
        assert_eq!(root.default_tag().unwrap(), "v1.4.2");
    }

    #[test]
    fn test_find_root_from_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"version": "2.0.0"}"#).unwrap();
        let file = temp.path().join("index.rs");
        std::fs::write(&file, "").unwrap();

        let root = find_package_root(&file).unwrap();
        assert_eq!(root.version().unwrap(), "2.0.0");
    }

    #[test]
    fn test_workspace_version_fallback() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Cargo.toml"),
            "[workspace]\nmembers = []\n\n[workspace.package]\nversion = \"0.3.0\"\n",
        )
        .unwrap();

        let root = find_package_root(temp.path()).unwrap();
        assert_eq!(root.version().unwrap(), "0.3.0");
    }

    #[test]
    fn test_member_inherits_workspace_version() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"crates/app\"]\n\n[workspace.package]\nversion = \"0.3.0\"\n",
        )
        .unwrap();
        let member = temp.path().join("crates/app");
        std::fs::create_dir_all(member.join("src")).unwrap();
        std::fs::write(
            member.join("Cargo.toml"),
            "[package]\nname = \"app\"\nversion.workspace = true\n",
        )
        .unwrap();

        let root = find_package_root(&member.join("src")).unwrap();
        assert_eq!(root.dir, member);
        assert_eq!(root.default_tag().unwrap(), "v0.3.0");
    }

    #[test]
    fn test_inherited_version_without_workspace_root() {
        let temp = TempDir::new().unwrap();
        let member = temp.path().join("app");
        std::fs::create_dir_all(&member).unwrap();
        std::fs::write(
            member.join("Cargo.toml"),
            "[package]\nname = \"app\"\nversion.workspace = true\n",
        )
        .unwrap();

        let root = find_package_root(&member).unwrap();
        assert!(matches!(root.version(), Err(Error::MissingVersion { .. })));
    }

    #[test]
    fn test_missing_version() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"name": "x"}"#).unwrap();

        let root = find_package_root(temp.path()).unwrap();
        assert!(matches!(root.version(), Err(Error::MissingVersion { .. })));
    }

    #[test]
    fn test_nearest_manifest_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();
        let inner = temp.path().join("inner");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(inner.join("package.json"), r#"{"version": "5.0.0"}"#).unwrap();

        let root = find_package_root(&inner).unwrap();
        assert_eq!(root.version().unwrap(), "5.0.0");
    }
}
