//! Status command implementation.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tracing::info;
use walkdir::WalkDir;

use relcache_core::INDEX_FILE_NAME;
use relcache_sync::{ResourceState, ResourceUnit};

use super::CommonArgs;
use crate::resources::Workspace;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

/// Cache status of one resource.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub id: String,
    pub state: ResourceState,
    pub location: String,
    pub auto_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    pub files: usize,
    pub bytes: u64,
}

impl ResourceStatus {
    fn of(unit: &ResourceUnit) -> Self {
        let index = unit.local_index().unwrap_or_default();
        let (files, bytes) = disk_usage(unit.location());
        Self {
            id: unit.to_string(),
            state: unit.state(),
            location: unit.location().display().to_string(),
            auto_update: unit.auto_update(),
            etag: index.etag,
            last_checked: index.last_checked,
            last_updated: index.last_updated,
            files,
            bytes,
        }
    }
}

/// Runs the status command.
///
/// # Errors
///
/// Returns an error if the resources file is invalid.
pub fn run(common: &CommonArgs, args: &StatusArgs) -> Result<()> {
    let workspace = Workspace::open(common)?;
    info!(resources = workspace.registry.len(), "Reading cache status");

    let statuses: Vec<_> = workspace
        .registry
        .units()
        .iter()
        .map(|unit| ResourceStatus::of(unit))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        print_text_status(&statuses);
    }
    Ok(())
}

fn print_text_status(statuses: &[ResourceStatus]) {
    if statuses.is_empty() {
        println!("No resources configured.");
        return;
    }

    for status in statuses {
        println!("{}", status.id);
        println!("  State:    {}", status.state);
        println!("  Location: {}", status.location);
        if let Some(etag) = &status.etag {
            println!("  Etag:     {etag}");
        }
        if let Some(checked) = status.last_checked {
            println!("  Checked:  {}", checked.to_rfc3339());
        }
        if let Some(updated) = status.last_updated {
            println!("  Updated:  {}", updated.to_rfc3339());
        }
        println!("  Contents: {} file(s), {} bytes", status.files, status.bytes);
        if !status.auto_update {
            println!("  Auto-update disabled");
        }
        println!();
    }
}

/// Counts extracted files and their total size, excluding the sidecar.
fn disk_usage(dir: &Path) -> (usize, u64) {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with(INDEX_FILE_NAME))
        .fold((0, 0), |(files, bytes), entry| {
            let size = entry.metadata().map_or(0, |meta| meta.len());
            (files + 1, bytes + size)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_disk_usage_skips_sidecar() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("nested/b.txt"), "abc").unwrap();
        std::fs::write(dir.path().join(INDEX_FILE_NAME), "{}").unwrap();

        assert_eq!(disk_usage(dir.path()), (2, 8));
    }

    #[test]
    fn test_disk_usage_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(disk_usage(&dir.path().join("absent")), (0, 0));
    }
}
