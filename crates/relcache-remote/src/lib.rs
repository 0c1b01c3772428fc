//! # relcache Remote
//!
//! Client for release origins publishing versioned artifacts.
//!
//! Every artifact is published as `<artifact>.tar.gz` together with a small
//! JSON manifest carrying its etag:
//!
//! ```text
//! https://<origin>/<owner>/<collection>/releases/download/<tag>/<artifact>.json
//! https://<origin>/<owner>/<collection>/releases/download/<tag>/<artifact>.tar.gz
//! ```
//!
//! Older releases publish a single `index.json` keyed by artifact name
//! instead ([`ManifestLayout::Aggregate`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relcache_core::ResourceId;
//! use relcache_remote::{HttpOrigin, OriginConfig, RemoteOrigin, RemoteUrls};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OriginConfig::default();
//!     let id: ResourceId = "acme/geo/v1.0.0/cities".parse()?;
//!     let urls = RemoteUrls::new(&config, &id);
//!
//!     let origin = HttpOrigin::new(config)?;
//!     let manifest = origin.fetch_manifest(&urls.index).await?;
//!     println!("{manifest}");
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod error;
mod manifest;

pub use client::{HttpOrigin, RemoteOrigin};
pub use config::{ManifestLayout, OriginConfig, DEFAULT_ORIGIN};
pub use error::OriginError;
pub use manifest::{manifest_entry, ManifestCache, RemoteUrls, AGGREGATE_INDEX};
pub use relcache_core::ManifestEntry;
