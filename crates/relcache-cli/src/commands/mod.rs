//! CLI commands and argument parsing.

pub mod check;
pub mod install;
pub mod status;
pub mod update;
pub mod watch;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use relcache_remote::ManifestLayout;

/// relcache - Cached release artifacts with etag revalidation
#[derive(Parser)]
#[command(name = "relcache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Resources file listing the resources to manage
    #[arg(short, long, global = true, env = "RELCACHE_CONFIG", default_value = "relcache.yaml")]
    pub config: PathBuf,

    /// Origin base URL (overrides the resources file)
    #[arg(long, global = true, env = "RELCACHE_ORIGIN")]
    pub origin: Option<String>,

    /// Global cache directory (overrides the resources file)
    #[arg(long, global = true, env = "RELCACHE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Manifest layout published by the origin (per-artifact, aggregate)
    #[arg(long, global = true, env = "RELCACHE_LAYOUT")]
    pub layout: Option<ManifestLayout>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "RELCACHE_TIMEOUT", default_value = "60")]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Reinstall every resource from the origin
    Install(install::InstallArgs),

    /// Revalidate every resource against the origin
    Update(update::UpdateArgs),

    /// Check a single resource, installing it if needed
    Check(check::CheckArgs),

    /// Show the cache state of every resource
    Status(status::StatusArgs),

    /// Keep resources up to date until interrupted
    Watch(watch::WatchArgs),

    /// Print version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update_flags() {
        let cli = Cli::parse_from([
            "relcache",
            "--layout",
            "aggregate",
            "update",
            "--force",
        ]);
        assert_eq!(cli.common.layout, Some(ManifestLayout::Aggregate));
        match cli.command {
            Commands::Update(args) => {
                assert!(!args.stale_only);
                assert!(args.force);
            }
            _ => panic!("expected update command"),
        }
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from(["relcache", "check", "acme/geo/v1/cities", "--no-install"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.id, "acme/geo/v1/cities");
                assert!(args.no_install);
            }
            _ => panic!("expected check command"),
        }
    }
}
