//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Utc};
use llmusage_core::{ProviderKind, Severity, Usage, UsageStats, UsageWindow};
use llmusage_providers::ConfiguredProvider;
use serde_json::Value;

use super::{format_duration, progress_bar};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Header printed above usage output.
const TITLE: &str = "LLM Usage Statistics";

/// Title for a provider id: the long name, or the id uppercased.
fn provider_title(id: &str) -> String {
    ProviderKind::from_id(id).map_or_else(|| id.to_uppercase(), |k| k.long_name().to_string())
}

/// Reads a count that may be a JSON number or a numeric string.
fn count(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the full usage report.
    pub fn format_stats(&self, stats: &UsageStats) -> String {
        let mut lines = vec![self.bold(TITLE), "=".repeat(TITLE.len()), String::new()];
        for usage in &stats.providers {
            lines.push(self.format_usage(usage));
            lines.push(String::new());
        }
        lines.join("\n")
    }

    /// Formats one provider account.
    pub fn format_usage(&self, usage: &Usage) -> String {
        let name = provider_title(&usage.provider_id);

        if let Some(err) = &usage.error {
            return format!("{}:\n  {} {err}", self.bold(&name), self.red("Error:"));
        }

        let heading = match usage.account() {
            Some(account) => format!("{name} ({account}):"),
            None => format!("{name}:"),
        };
        let mut lines = vec![
            self.bold(&heading),
            "-".repeat(heading.chars().count()),
        ];

        if usage.windows.is_empty() {
            lines.push(self.dim("  No usage windows reported"));
        }
        for window in &usage.windows {
            lines.push(self.format_window(window));
        }

        if let Some(extra) = usage.extra.get("extra_usage") {
            lines.extend(self.format_extra_usage(extra));
        }
        if let Some(sub) = usage.extra.get("subscription") {
            lines.extend(self.format_subscription(sub));
        }

        lines.join("\n")
    }

    /// Formats a usage window with progress bar and reset countdown.
    pub fn format_window(&self, window: &UsageWindow) -> String {
        let resets = match window.time_until_reset() {
            Some(until) => format!("in {}", format_duration(until)),
            None => "N/A".to_string(),
        };
        format!(
            "  {}:\n    Usage:    {}  {:.1}%\n    Resets:   {}",
            window.label,
            self.bar(window.utilization),
            window.utilization,
            self.dim(&resets)
        )
    }

    /// Formats a colored usage bar.
    pub fn bar(&self, utilization: f64) -> String {
        let bar = progress_bar(utilization);
        if !self.use_colors {
            return bar;
        }
        match Severity::from_utilization(utilization) {
            Severity::Normal => self.paint(GREEN, &bar),
            Severity::Warning => self.paint(YELLOW, &bar),
            Severity::Critical => self.paint(RED, &bar),
        }
    }

    fn format_extra_usage(&self, extra: &Value) -> Vec<String> {
        let mut lines = vec!["Extra Usage Credits:".to_string()];
        if let Some(util) = extra.get("utilization").and_then(Value::as_f64) {
            lines.push(format!("  Usage:    {}  {util:.1}%", self.bar(util)));
        }
        if let (Some(used), Some(limit)) = (
            extra.get("used_credits").and_then(Value::as_f64),
            extra.get("monthly_limit").and_then(Value::as_f64),
        ) {
            lines.push(format!("  Credits:  ${used:.2} / ${limit:.2}"));
        }
        lines
    }

    fn format_subscription(&self, sub: &Value) -> Vec<String> {
        let mut lines = vec![self.paint(CYAN, "Subscription:")];

        if let Some(plan) = sub.get("plan") {
            let field = |key: &str| plan.get(key).and_then(Value::as_str).unwrap_or_default();
            let status = field("status");
            let styled = match status {
                "Active" => self.paint(GREEN, status),
                "Cancelled" => self.paint(YELLOW, status),
                "Expired" => self.paint(RED, status),
                other => other.to_string(),
            };
            lines.push(format!(
                "  Plan:     {} {} {styled}",
                field("title"),
                self.dim(&format!("({})", field("level")))
            ));
        }

        if let Some(status) = sub.get("status").and_then(Value::as_str) {
            lines.push(format!("  Status:   {status}"));
        }

        let expires = sub
            .get("expires_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        if let Some(expires) = expires {
            let date = expires.format("%Y-%m-%d").to_string();
            let remaining = expires - Utc::now();
            let text = if remaining > chrono::Duration::zero() {
                format!(
                    "{date} {}",
                    self.dim(&format!("({} remaining)", format_duration(remaining)))
                )
            } else {
                self.red(&format!("{date} (expired)"))
            };
            lines.push(format!("  Expires:  {text}"));
        }

        if let Some(features) = sub.get("features").and_then(Value::as_array) {
            if !features.is_empty() {
                lines.push("  Features:".to_string());
            }
            for feature in features {
                let name = feature.get("feature").and_then(Value::as_str).unwrap_or_default();
                let left = feature.get("left").map_or(0.0, count);
                let total = feature.get("total").map_or(0.0, count);
                let used_pct = if total > 0.0 { (total - left) / total * 100.0 } else { 0.0 };
                lines.push(format!(
                    "    {}: {} {}",
                    self.paint(CYAN, name),
                    self.bar(used_pct),
                    self.dim(&format!("{left}/{total} left"))
                ));
            }
        }

        lines
    }

    /// Hint shown when resolution produced nothing.
    pub fn format_no_providers(&self) -> String {
        format!(
            "{}\n\nAdd an account with:\n  llm-usage accounts add <provider> <name> ...\nor log in with the Claude CLI.",
            self.yellow("No providers configured.")
        )
    }

    /// Formats the configured provider listing.
    pub fn format_providers(&self, providers: &[ConfiguredProvider]) -> String {
        if providers.is_empty() {
            return self.format_no_providers();
        }
        let mut lines = vec![
            format!("{:<10} {:<10} {}", "Provider", "Name", "Accounts"),
            "─".repeat(40),
        ];
        for p in providers {
            lines.push(format!(
                "{:<10} {:<10} {}",
                self.bold(&p.id),
                p.name,
                p.accounts.join(", ")
            ));
        }
        lines.join("\n")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}
