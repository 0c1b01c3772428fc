//! Resource identifiers and registration request resolution.
//!
//! A registration request is either a plain `owner/collection/tag/artifact`
//! string or a structured [`ResourceSpec`]. [`resolve`] turns either form
//! into a [`ResolvedResource`]: the canonical [`ResourceId`] plus the local
//! directory the resource is cached in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::HostInfo;
use crate::location::{CacheRoots, LocationKind};
use crate::package::{find_package_root, PackageRoot};

/// Native build flavours with an ABI-versioned artifact naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeKind {
    /// Stable-ABI addon (`napi-v<abi>-...`).
    Napi,

    /// Module-version bound addon (`node-v<abi>-...`).
    Node,
}

impl NativeKind {
    /// Returns the artifact name prefix for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Napi => "napi",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native build selection for artifact name synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBuild {
    /// Native kind.
    pub kind: NativeKind,

    /// Pinned ABI version; the host's version for `kind` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl NativeBuild {
    /// Selects a native kind using the host's ABI version.
    #[must_use]
    pub const fn new(kind: NativeKind) -> Self {
        Self {
            kind,
            version: None,
        }
    }

    /// Pins the ABI version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Fully resolved four-segment resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    owner: String,
    collection: String,
    tag: String,
    artifact: String,
}

impl ResourceId {
    /// Creates an identifier from its segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if any segment is empty or not
    /// usable as a path component.
    pub fn new(
        owner: impl Into<String>,
        collection: impl Into<String>,
        tag: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Result<Self> {
        let id = Self {
            owner: owner.into(),
            collection: collection.into(),
            tag: tag.into(),
            artifact: artifact.into(),
        };
        for segment in [&id.owner, &id.collection, &id.tag, &id.artifact] {
            validate_segment(&id.to_string(), segment)?;
        }
        Ok(id)
    }

    /// Repository owner or namespace.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository-like grouping.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Version label.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.artifact
    }

    /// Returns `<root>/<owner>-<collection>-<tag>/<artifact>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use relcache_core::ResourceId;
    ///
    /// let id: ResourceId = "acme/geo/v2.1.0/cities".parse().unwrap();
    /// assert_eq!(
    ///     id.resource_dir(Path::new("/cache")),
    ///     PathBuf::from("/cache/acme-geo-v2.1.0/cities")
    /// );
    /// ```
    #[must_use]
    pub fn resource_dir(&self, root: &Path) -> PathBuf {
        root.join(format!("{}-{}-{}", self.owner, self.collection, self.tag))
            .join(&self.artifact)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.owner, self.collection, self.tag, self.artifact
        )
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split('/').collect();
        match segments.as_slice() {
            [owner, collection, tag, artifact] => Self::new(*owner, *collection, *tag, *artifact),
            _ => Err(Error::InvalidIdentifier {
                id: s.to_string(),
                reason: "expected owner/collection/tag/artifact".to_string(),
            }),
        }
    }
}

impl Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Structured registration request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// `owner/collection`, optionally followed by `/tag` and `/artifact`.
    pub id: String,

    /// Release tag; the consuming package's `v<version>` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Platform label override for native artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Architecture label override for native artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,

    /// Native build used to synthesize the artifact name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeBuild>,

    /// Cache location; `package` for native artifacts, `global` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationKind>,

    /// Whether the auto-update scheduler refreshes this resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<bool>,
}

impl ResourceSpec {
    /// Creates a request for `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Requests a native artifact.
    #[must_use]
    pub fn with_native(mut self, native: NativeBuild) -> Self {
        self.native = Some(native);
        self
    }

    /// Overrides the platform label.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Overrides the architecture label.
    #[must_use]
    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    /// Sets the cache location.
    #[must_use]
    pub const fn with_location(mut self, location: LocationKind) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the auto-update flag.
    #[must_use]
    pub const fn with_auto_update(mut self, auto_update: bool) -> Self {
        self.auto_update = Some(auto_update);
        self
    }
}

/// A registration request in either accepted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceRequest {
    /// `owner/collection[/tag[/artifact]]`.
    Id(String),

    /// Structured request.
    Spec(ResourceSpec),
}

impl From<&str> for ResourceRequest {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for ResourceRequest {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<ResourceSpec> for ResourceRequest {
    fn from(spec: ResourceSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<&ResourceId> for ResourceRequest {
    fn from(id: &ResourceId) -> Self {
        Self::Id(id.to_string())
    }
}

/// Inputs that resolution may default from.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Location of the registering module, used to find its package root.
    pub caller_location: &'a Path,

    /// Host description for native artifact names.
    pub host: &'a HostInfo,

    /// Cache roots.
    pub roots: &'a CacheRoots,
}

/// Outcome of resolving a registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Canonical identifier.
    pub id: ResourceId,

    /// Absolute directory holding the extracted contents.
    pub location: PathBuf,

    /// Which cache root `location` lives under.
    pub location_kind: LocationKind,

    /// Whether the auto-update scheduler refreshes this resource.
    pub auto_update: bool,
}

/// Resolves a registration request.
///
/// Deterministic for a given request and context: the same input always
/// yields the same canonical id and location.
///
/// # Errors
///
/// Returns a configuration error when the identifier is malformed, when
/// neither an artifact nor a native kind is given, when a native ABI version
/// is unknown, or when the tag or package location requires a package root
/// that cannot be found or has no version.
pub fn resolve(request: &ResourceRequest, ctx: &ResolveContext<'_>) -> Result<ResolvedResource> {
    let owned;
    let spec = match request {
        ResourceRequest::Id(id) => {
            owned = ResourceSpec::new(id.as_str());
            &owned
        }
        ResourceRequest::Spec(spec) => spec,
    };

    let segments: Vec<&str> = spec.id.split('/').collect();
    if !(2..=4).contains(&segments.len()) {
        return Err(Error::InvalidIdentifier {
            id: spec.id.clone(),
            reason: "expected owner/collection[/tag[/artifact]]".to_string(),
        });
    }
    for segment in &segments {
        validate_segment(&spec.id, segment)?;
    }

    let mut package: Option<PackageRoot> = None;
    let mut package_root = || -> Result<PackageRoot> {
        if let Some(root) = &package {
            return Ok(root.clone());
        }
        let root = find_package_root(ctx.caller_location)?;
        package = Some(root.clone());
        Ok(root)
    };

    let tag = match (segments.get(2), &spec.tag) {
        (Some(tag), _) => (*tag).to_string(),
        (None, Some(tag)) => tag.clone(),
        (None, None) => package_root()?.default_tag()?,
    };

    let artifact = match (segments.get(3), &spec.native) {
        (Some(artifact), _) => (*artifact).to_string(),
        (None, Some(native)) => native_artifact_name(native, spec, ctx.host)?,
        (None, None) => {
            return Err(Error::MissingArtifact {
                id: format!("{}/{}/{tag}", segments[0], segments[1]),
            })
        }
    };

    let id = ResourceId::new(segments[0], segments[1], tag, artifact)?;

    let location_kind = spec.location.unwrap_or(if spec.native.is_some() {
        LocationKind::Package
    } else {
        LocationKind::Global
    });

    let root = match location_kind {
        LocationKind::Global => ctx.roots.global_root().to_path_buf(),
        LocationKind::Package => ctx.roots.package_root(&package_root()?.dir),
    };

    Ok(ResolvedResource {
        location: id.resource_dir(&root),
        id,
        location_kind,
        auto_update: spec.auto_update.unwrap_or(spec.native.is_none()),
    })
}

/// Builds `<kind>-v<abi>-<platform>-<architecture>`.
fn native_artifact_name(native: &NativeBuild, spec: &ResourceSpec, host: &HostInfo) -> Result<String> {
    let version = match &native.version {
        Some(version) => version.as_str(),
        None => host
            .abi_version(native.kind)
            .ok_or_else(|| Error::MissingAbiVersion {
                kind: native.kind.to_string(),
            })?,
    };
    let platform = spec.platform.as_deref().unwrap_or(&host.platform);
    let architecture = spec.architecture.as_deref().unwrap_or(&host.architecture);

    Ok(format!("{}-v{version}-{platform}-{architecture}", native.kind))
}

fn validate_segment(id: &str, segment: &str) -> Result<()> {
    let reason = if segment.is_empty() {
        "empty segment"
    } else if segment == "." || segment == ".." {
        "relative path segment"
    } else if segment.contains(['\\', ':']) || segment.chars().any(char::is_whitespace) {
        "segment contains a reserved character"
    } else if segment.contains(['?', '#', '%']) {
        "segment contains a URL delimiter"
    } else {
        return Ok(());
    };

    Err(Error::InvalidIdentifier {
        id: id.to_string(),
        reason: reason.to_string(),
    })
}
