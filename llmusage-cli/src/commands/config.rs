//! Config command - show paths and effective settings, reset to defaults.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use llmusage_store::{Settings, default_cache_dir, default_config_dir, default_settings_path};
use serde_json::json;
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Overwrite the settings file with defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, settings: &Settings) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Show => show_config(cli, settings)?,
        ConfigAction::Path => show_paths(cli)?,
        ConfigAction::Reset => {
            let path = default_settings_path();
            reset_settings(&path).await?;
            if cli.output_format() == OutputFormat::Text {
                println!("Configuration reset to defaults");
            } else {
                println!("{}", json!({ "settings_file": path.display().to_string() }));
            }
        }
    }
    Ok(ExitCode::Success)
}

fn show_config(cli: &Cli, settings: &Settings) -> Result<()> {
    match cli.output_format() {
        OutputFormat::Text => {
            println!("llm-usage Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Default provider:       {}", settings.default_provider);
            println!(
                "Subscription cache TTL: {}m",
                settings.subscription_cache_ttl_minutes
            );
            println!("Log level:              {}", settings.log_level);
            println!(
                "Server:                 {}:{}",
                settings.server.host, settings.server.port
            );
        }
        OutputFormat::Json | OutputFormat::Waybar => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(settings)?);
        }
    }
    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let cache_dir = default_cache_dir();
    let settings_path = default_settings_path();

    match cli.output_format() {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Cache dir:     {}", cache_dir.display());
            println!("Settings file: {}", settings_path.display());
        }
        OutputFormat::Json | OutputFormat::Waybar => {
            let paths = json!({
                "config_dir": config_dir.display().to_string(),
                "cache_dir": cache_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }
    Ok(())
}

async fn reset_settings(path: &Path) -> Result<Settings> {
    let settings = Settings::default();
    settings.save(path).await?;
    info!(path = %path.display(), "Settings reset");
    Ok(settings)
}
