//! Waybar custom module output.
//!
//! One JSON object per invocation: `{text, tooltip, class, percentage}`.
//! `class` is the severity of the highest utilization, or `error` when
//! every provider failed.

use llmusage_core::{UsageStats, display_name_for, short_name_for};
use serde::Serialize;

use super::format_duration;

/// Class used when nothing could be fetched.
pub const ERROR_CLASS: &str = "error";

/// Waybar module payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaybarOutput {
    /// Compact bar text, e.g. `C:45% K:12%`.
    pub text: String,
    /// Multi-line tooltip.
    pub tooltip: String,
    /// CSS class.
    pub class: String,
    /// 0-100.
    pub percentage: u8,
}

impl WaybarOutput {
    /// Builds the payload from fetched stats.
    pub fn from_stats(stats: &UsageStats) -> Self {
        let text = stats
            .providers
            .iter()
            .filter(|u| !u.is_error())
            .filter_map(|u| {
                u.primary_window().map(|w| {
                    format!("{}:{:.0}%", short_name_for(&u.provider_id), w.utilization)
                })
            })
            .collect::<Vec<_>>()
            .join(" ");

        let mut lines = vec!["LLM Usage".to_string(), String::new()];
        for usage in &stats.providers {
            if let Some(err) = &usage.error {
                lines.push(err.clone());
                continue;
            }
            let account = usage
                .account()
                .map(|a| format!(" ({a})"))
                .unwrap_or_default();
            let name = display_name_for(&usage.provider_id);
            for window in &usage.windows {
                let mut line = format!("{name}{account} {}: {:.1}%", window.label, window.utilization);
                if let Some(until) = window.time_until_reset() {
                    line.push_str(&format!(" (resets in {})", format_duration(until)));
                }
                lines.push(line);
            }
        }

        let class = if stats.all_failed() {
            ERROR_CLASS.to_string()
        } else {
            stats.severity().as_str().to_string()
        };

        Self {
            text,
            tooltip: lines.join("\n"),
            class,
            percentage: clamp_percentage(stats.max_utilization()),
        }
    }

    /// Error widget.
    pub fn error(message: &str) -> Self {
        Self {
            text: "LLM: Error".to_string(),
            tooltip: message.to_string(),
            class: ERROR_CLASS.to_string(),
            percentage: 0,
        }
    }

    /// Serializes to a single line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"text":"LLM: Error","tooltip":"","class":"error","percentage":0}"#.to_string()
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_percentage(utilization: f64) -> u8 {
    if utilization.is_nan() {
        return 0;
    }
    utilization.clamp(0.0, 100.0) as u8
}

/// Renders stats as a waybar line.
pub fn render(stats: &UsageStats) -> String {
    WaybarOutput::from_stats(stats).to_json()
}

/// Renders an error widget.
pub fn render_error(message: &str) -> String {
    WaybarOutput::error(message).to_json()
}
