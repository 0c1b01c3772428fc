//! # relcache Core
//!
//! Core types for relcache, a local cache of versioned release artifacts
//! kept in sync with a remote origin.
//!
//! This crate provides:
//!
//! - [`ResourceId`] and [`resolve`] - registration requests resolved to a
//!   canonical `owner/collection/tag/artifact` id and a cache directory
//! - [`LocalIndex`] and [`LocalIndexStore`] - the per-resource JSON sidecar
//! - [`HostInfo`] - platform labels used to name native artifacts
//! - [`archive`] - `.tar.gz` extraction into resource directories
//!
//! ## Example
//!
//! ```rust
//! use std::path::Path;
//! use relcache_core::{resolve, CacheRoots, HostInfo, ResolveContext};
//!
//! let host = HostInfo::new("linux", "x64");
//! let roots = CacheRoots::new("/var/cache/relcache");
//! let ctx = ResolveContext {
//!     caller_location: Path::new("."),
//!     host: &host,
//!     roots: &roots,
//! };
//!
//! let resolved = resolve(&"acme/geo/v1.0.0/cities".into(), &ctx)?;
//! assert_eq!(resolved.id.to_string(), "acme/geo/v1.0.0/cities");
//! # Ok::<(), relcache_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod error;
pub mod host;
pub mod identifier;
pub mod index;
pub mod location;
pub mod package;

#[cfg(test)]
mod proptest_tests;

// Re-export main types at crate root
pub use archive::{extract_tar_gz, extract_tar_gz_async};
pub use error::{Error, Result};
pub use host::HostInfo;
pub use identifier::{
    resolve, NativeBuild, NativeKind, ResolveContext, ResolvedResource, ResourceId,
    ResourceRequest, ResourceSpec,
};
pub use index::{LocalIndex, LocalIndexStore, ManifestEntry, INDEX_FILE_NAME};
pub use location::{CacheRoots, LocationKind};
pub use package::{find_package_root, PackageRoot};
