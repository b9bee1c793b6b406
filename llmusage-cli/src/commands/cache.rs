//! Cache command - manage cached subscription lookups.

use anyhow::Result;
use clap::{Args, Subcommand};
use llmusage_store::CacheManager;
use tracing::info;

use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove every cached entry.
    Clear,

    /// Show the cache directory.
    Path,
}

/// Runs the cache command.
pub async fn run(args: &CacheArgs, cli: &Cli) -> Result<ExitCode> {
    let cache = CacheManager::open_default();

    match &args.action {
        CacheAction::Clear => {
            let removed = cache.clear().await?;
            info!(removed, "Cache cleared");
            if cli.output_format() == OutputFormat::Text {
                println!("Removed {removed} cached entries");
            } else {
                println!("{}", serde_json::json!({ "removed": removed }));
            }
        }
        CacheAction::Path => println!("{}", cache.dir().display()),
    }

    Ok(ExitCode::Success)
}
