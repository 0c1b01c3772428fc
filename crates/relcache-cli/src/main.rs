//! relcache CLI - keeps release artifacts cached locally.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod resources;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.common.verbose { "debug" } else { "info" };
    let default_filter = format!(
        "relcache={level},relcache_core={level},relcache_remote={level},relcache_sync={level}"
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Install(args) => commands::install::run(&cli.common, &args).await,
        Commands::Update(args) => commands::update::run(&cli.common, &args).await,
        Commands::Check(args) => commands::check::run(&cli.common, &args).await,
        Commands::Status(args) => commands::status::run(&cli.common, &args),
        Commands::Watch(args) => commands::watch::run(&cli.common, &args).await,
        Commands::Version => {
            println!("relcache {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
