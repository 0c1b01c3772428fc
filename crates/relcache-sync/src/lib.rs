//! relcache Sync
//!
//! This crate keeps locally cached release artifacts in step with their
//! origin.
//!
//! # Overview
//!
//! - **Update protocol**: [`ResourceUnit::update`] revalidates by etag and
//!   only downloads when the origin has something new
//! - **Degrade, don't fail**: an unreachable origin leaves an installed copy
//!   usable ([`UpdateStatus::Degraded`])
//! - **Registry**: [`ResourceRegistry`] deduplicates registrations and runs
//!   sequential batch updates with aligned progress lines
//! - **Auto-update**: [`ResourceRegistry::start_update`] arms a recurring
//!   timer for units that opted in
//!
//! # Architecture
//!
//! ```text
//!  add(request) ──► resolve ──► ResourceUnit ──► .index.json
//!                                   │
//!                     ┌─────────────┴─────────────┐
//!                     ▼                           ▼
//!             <artifact>.json              <artifact>.tar.gz
//!              (etag check)               (download + extract)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use relcache_sync::{BatchOptions, RegistryConfig, ResourceRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ResourceRegistry::new(RegistryConfig::default())?;
//!     registry.add("acme/geo/v1.0.0/cities", Path::new(file!()))?;
//!
//!     let report = registry.update(BatchOptions::default().with_log(true)).await;
//!     if report.is_failed() {
//!         eprintln!("{} resource(s) failed", report.failed);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::significant_drop_tightening)]

pub mod config;
pub mod error;
pub mod event;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod unit;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use config::{RegistryConfig, RegistryConfigBuilder};
pub use error::{Result, SyncError};
pub use event::ResourceEvent;
pub use outcome::{ResourceState, UpdateOutcome, UpdateStatus};
pub use registry::{BatchOptions, ResourceRegistry};
pub use report::{BatchEntry, BatchReport};
pub use unit::{CheckOptions, ResourceUnit, UpdateOptions};
