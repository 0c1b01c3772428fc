//! Check command implementation.
//!
//! Checks one resource, installing it on first use. The resource need not
//! be listed in the resources file.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use relcache_sync::CheckOptions;

use super::CommonArgs;
use crate::resources::Workspace;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Resource id (`owner/collection[/tag[/artifact]]`)
    pub id: String,

    /// Fail instead of installing a resource that is not cached yet
    #[arg(long)]
    pub no_install: bool,

    /// Consult the origin even if the resource was checked recently
    #[arg(short, long)]
    pub remote: bool,

    /// Fail on any origin error instead of keeping a stale copy
    #[arg(long)]
    pub force_remote: bool,
}

impl CheckArgs {
    const fn options(&self) -> CheckOptions {
        CheckOptions {
            install: !self.no_install,
            remote: self.remote,
            force_remote: self.force_remote,
        }
    }
}

/// Runs the check command.
///
/// # Errors
///
/// Returns an error if the id cannot be resolved, the resource is missing
/// and installation was declined, or the check fails fatally.
pub async fn run(common: &CommonArgs, args: &CheckArgs) -> Result<()> {
    let workspace = Workspace::open(common)?;
    let unit = workspace
        .registry
        .add(args.id.as_str(), &workspace.anchor)
        .with_context(|| format!("Invalid resource id '{}'", args.id))?;

    info!(id = %unit, "Checking resource");
    let outcome = unit
        .check(args.options())
        .await
        .with_context(|| format!("Check of {unit} failed"))?;

    println!("{unit}: {}", outcome.status_text());
    println!("  Location: {}", unit.location().display());
    if let Some(etag) = unit.local_index().and_then(|index| index.etag) {
        println!("  Etag:     {etag}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let args = CheckArgs {
            id: "acme/geo/v1/cities".to_string(),
            no_install: true,
            remote: false,
            force_remote: true,
        };
        let options = args.options();
        assert!(!options.install);
        assert!(!options.remote);
        assert!(options.force_remote);
    }
}
