// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! llm-usage - LLM subscription quota monitoring from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Show usage for every configured provider and account
//! llm-usage
//!
//! # One provider, one account
//! llm-usage --provider kimi --account work
//!
//! # Status bar widget
//! llm-usage --waybar
//!
//! # JSON output
//! llm-usage --format json --pretty
//!
//! # HTTP API
//! llm-usage serve --port 8080
//!
//! # Manage accounts
//! llm-usage accounts add kimi work --api-key sk-...
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use llmusage_store::{LogLevel, Settings, StoreError, default_settings_path};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{accounts, cache, config, providers, serve, usage};

// ============================================================================
// CLI Definition
// ============================================================================

/// llm-usage - LLM subscription quota monitoring.
#[derive(Parser)]
#[command(name = "llm-usage")]
#[command(about = "Report quota utilization across LLM subscriptions")]
#[command(long_about = r"
llm-usage reports how much of each LLM subscription quota is used.

Supported providers:
  • Claude Pro/Max (claude)
  • Kimi (kimi)
  • Z.AI (zai)
  • MiniMax (minimax)

Examples:
  llm-usage                          # All configured providers
  llm-usage -p claude,kimi           # Selected providers
  llm-usage -p kimi -a work          # One account
  llm-usage --waybar                 # Waybar custom module JSON
  llm-usage serve                    # HTTP API
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format.
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, conflicts_with = "waybar")]
    pub json: bool,

    /// Shorthand for `--format waybar`.
    #[arg(long, global = true)]
    pub waybar: bool,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Providers to query: "all" or a comma-separated list like "claude,kimi".
    #[arg(long, short, global = true)]
    pub provider: Option<String>,

    /// Account to query. Empty means every account.
    #[arg(long, short, global = true)]
    pub account: Option<String>,

    /// Query every account, ignoring `--account`.
    #[arg(long, global = true)]
    pub all_accounts: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logging).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Effective output format after shorthands.
    pub fn output_format(&self) -> OutputFormat {
        if self.waybar {
            OutputFormat::Waybar
        } else if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    /// Account filter, empty when not given.
    pub fn account_filter(&self) -> &str {
        self.account.as_deref().unwrap_or_default()
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch current usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage,

    /// List configured providers and accounts.
    #[command(visible_alias = "p")]
    Providers,

    /// Serve usage over HTTP.
    Serve(serve::ServeArgs),

    /// Manage provider accounts.
    Accounts(accounts::AccountsArgs),

    /// Copy the Claude CLI's credential file into the store.
    MigrateClaude,

    /// Manage the subscription cache.
    Cache(cache::CacheArgs),

    /// Show or reset configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
    /// Waybar custom module JSON.
    Waybar,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error, or every provider failed.
    Error = 1,
    /// Nothing configured.
    NoProviders = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("llmusage=debug,llm_usage=debug,info")
        } else {
            EnvFilter::new(format!("llmusage={level},llm_usage={level}"))
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Falls back to default settings, reporting why. Call after logging is up.
fn settings_or_default(loaded: Result<Settings, StoreError>) -> Settings {
    loaded.unwrap_or_else(|e| {
        warn!(
            path = %default_settings_path().display(),
            error = %e,
            "Failed to load settings, using defaults"
        );
        Settings::default()
    })
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Settings::load(&default_settings_path()).await;
    let level = loaded.as_ref().map_or(LogLevel::default(), |s| s.log_level);

    setup_logging(cli.verbose, cli.quiet, level);
    let settings = settings_or_default(loaded);

    let result = match &cli.command {
        None | Some(Commands::Usage) => usage::run(&cli, &settings).await,
        Some(Commands::Providers) => providers::run(&cli, &settings).await,
        Some(Commands::Serve(args)) => serve::run(args, &settings).await,
        Some(Commands::Accounts(args)) => accounts::run(args, &cli).await,
        Some(Commands::MigrateClaude) => accounts::migrate_claude(&cli).await,
        Some(Commands::Cache(args)) => cache::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli, &settings).await,
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if cli.output_format() == OutputFormat::Waybar {
                println!("{}", output::waybar::render_error(&format!("{e:#}")));
            } else {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
