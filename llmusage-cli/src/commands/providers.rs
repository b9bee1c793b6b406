//! Providers command - list configured providers and accounts.

use anyhow::Result;
use llmusage_store::Settings;
use tracing::info;

use super::default_resolver;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the providers command.
pub async fn run(cli: &Cli, settings: &Settings) -> Result<ExitCode> {
    let providers = default_resolver(settings).list_configured().await;
    info!(count = providers.len(), "Listing providers");

    match cli.output_format() {
        OutputFormat::Json | OutputFormat::Waybar => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&providers)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_providers(&providers));
            if providers.is_empty() {
                return Ok(ExitCode::NoProviders);
            }
        }
    }

    Ok(ExitCode::Success)
}
