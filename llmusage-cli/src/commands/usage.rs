//! Usage command - fetch and display provider usage.

use anyhow::Result;
use llmusage_core::UsageStats;
use llmusage_fetch::fetch_all;
use llmusage_store::Settings;
use tracing::{info, warn};

use super::{default_resolver, provider_filter};
use crate::output::{JsonFormatter, TextFormatter, waybar};
use crate::{Cli, ExitCode, OutputFormat};

/// Tooltip shown by the waybar widget when nothing resolved.
const NO_PROVIDERS_MESSAGE: &str = "No providers configured";

/// Runs the usage command.
pub async fn run(cli: &Cli, settings: &Settings) -> Result<ExitCode> {
    let resolver = default_resolver(settings);
    let filter = provider_filter(cli.provider.as_deref(), settings);

    let instances = resolver
        .resolve(filter, cli.account_filter(), cli.all_accounts)
        .await;

    info!(providers = filter, count = instances.len(), "Fetching usage");

    if instances.is_empty() {
        return Ok(report_no_providers(cli));
    }

    let stats = fetch_all(&instances).await;
    for failed in stats.errors() {
        warn!(provider = %failed.provider_id, error = ?failed.error, "Provider failed");
    }

    print!("{}", render(cli, &stats)?);

    if stats.all_failed() && cli.output_format() == OutputFormat::Text {
        return Ok(ExitCode::Error);
    }
    Ok(ExitCode::Success)
}

/// Renders stats in the requested format, newline-terminated.
pub fn render(cli: &Cli, stats: &UsageStats) -> Result<String> {
    let body = match cli.output_format() {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_stats(stats),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format(stats)?,
        OutputFormat::Waybar => waybar::render(stats),
    };
    Ok(format!("{body}\n"))
}

fn report_no_providers(cli: &Cli) -> ExitCode {
    match cli.output_format() {
        OutputFormat::Text => {
            eprintln!("{}", TextFormatter::new(!cli.no_color).format_no_providers());
            ExitCode::NoProviders
        }
        OutputFormat::Json => {
            let empty = if cli.pretty {
                "{\n  \"providers\": []\n}"
            } else {
                r#"{"providers":[]}"#
            };
            println!("{empty}");
            ExitCode::Success
        }
        OutputFormat::Waybar => {
            println!("{}", waybar::render_error(NO_PROVIDERS_MESSAGE));
            ExitCode::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use llmusage_core::{Usage, UsageWindow};
    use serde_json::Value;

    fn stats() -> UsageStats {
        UsageStats::new(vec![
            Usage::new("claude").with_window(UsageWindow::new("5-Hour Window", 45.0)),
        ])
    }

    #[test]
    fn test_render_json() {
        let cli = Cli::parse_from(["llm-usage", "--json"]);
        let out = render(&cli, &stats()).unwrap();
        let value: Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["providers"][0]["provider"], "claude");
    }

    #[test]
    fn test_render_waybar() {
        let cli = Cli::parse_from(["llm-usage", "--waybar"]);
        let out = render(&cli, &stats()).unwrap();
        let value: Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["text"], "C:45%");
        assert_eq!(value["class"], "normal");
    }

    #[test]
    fn test_render_text() {
        let cli = Cli::parse_from(["llm-usage", "--no-color"]);
        let out = render(&cli, &stats()).unwrap();
        assert!(out.starts_with("LLM Usage Statistics"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_waybar_flag_wins() {
        let cli = Cli::parse_from(["llm-usage", "--format", "json", "--waybar"]);
        assert_eq!(cli.output_format(), OutputFormat::Waybar);
    }
}
