//! CLI output formatting tests.
//!
//! These tests verify the text, JSON and waybar renderings of usage stats.

#[cfg(test)]
mod helper_tests {
    use super::super::{format_duration, progress_bar};
    use chrono::Duration;

    #[test]
    fn test_progress_bar_empty() {
        assert_eq!(progress_bar(0.0), "░".repeat(20));
    }

    #[test]
    fn test_progress_bar_half() {
        assert_eq!(progress_bar(50.0), format!("{}{}", "█".repeat(10), "░".repeat(10)));
    }

    #[test]
    fn test_progress_bar_rounds_down() {
        // 4.99 cells
        assert_eq!(progress_bar(24.95).matches('█').count(), 4);
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(progress_bar(150.0), "█".repeat(20));
        assert_eq!(progress_bar(-5.0), "░".repeat(20));
        assert_eq!(progress_bar(f64::NAN), "░".repeat(20));
    }

    #[test]
    fn test_format_duration() {
        let d = Duration::days(1) + Duration::hours(2) + Duration::minutes(3);
        assert_eq!(format_duration(d), "1d 2h 3m");
        assert_eq!(format_duration(Duration::hours(5)), "5h");
        assert_eq!(format_duration(Duration::seconds(30)), "0m");
        assert_eq!(format_duration(Duration::minutes(-1)), "expired");
    }
}

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use chrono::{Duration, Utc};
    use llmusage_core::{Usage, UsageStats, UsageWindow};
    use llmusage_providers::ConfiguredProvider;
    use serde_json::json;

    fn claude_usage() -> Usage {
        Usage::new("claude")
            .with_window(
                UsageWindow::new("5-Hour Window", 45.0)
                    .with_resets_at(Some(Utc::now() + Duration::hours(2) + Duration::seconds(30))),
            )
            .with_window(UsageWindow::new("7-Day Window", 12.5))
    }

    #[test]
    fn test_format_stats_header_and_windows() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_stats(&UsageStats::new(vec![claude_usage()]));

        assert!(output.starts_with("LLM Usage Statistics\n===================="));
        assert!(output.contains("Claude (Pro/Max Subscription):"));
        assert!(output.contains("  5-Hour Window:"));
        assert!(output.contains("45.0%"));
        assert!(output.contains("Resets:   in 2h"));
        assert!(output.contains("Resets:   N/A"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_account_suffix() {
        let formatter = TextFormatter::new(false);
        let mut usage = claude_usage();
        usage.set_account("work");
        let output = formatter.format_usage(&usage);
        assert!(output.starts_with("Claude (Pro/Max Subscription) (work):"));
    }

    #[test]
    fn test_error_block() {
        let formatter = TextFormatter::new(false);
        let usage = Usage::from_error("kimi", "Kimi", "API returned status 401: unauthorized");
        let output = formatter.format_usage(&usage);
        assert_eq!(
            output,
            "Kimi:\n  Error: Kimi: API returned status 401: unauthorized"
        );
    }

    #[test]
    fn test_unknown_provider_uppercased() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_usage(&Usage::new("acme"));
        assert!(output.starts_with("ACME:"));
    }

    #[test]
    fn test_bar_colors_by_severity() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.bar(10.0).contains("\x1b[32m"));
        assert!(formatter.bar(80.0).contains("\x1b[33m"));
        assert!(formatter.bar(95.0).contains("\x1b[31m"));
    }

    #[test]
    fn test_extra_usage_credits() {
        let formatter = TextFormatter::new(false);
        let mut usage = claude_usage();
        usage.extra.insert(
            "extra_usage".to_string(),
            json!({"utilization": 25.0, "used_credits": 12.5, "monthly_limit": 50.0}),
        );
        let output = formatter.format_usage(&usage);
        assert!(output.contains("Extra Usage Credits:"));
        assert!(output.contains("$12.50 / $50.00"));
    }

    #[test]
    fn test_subscription_block() {
        let formatter = TextFormatter::new(false);
        let mut usage = Usage::new("kimi").with_window(UsageWindow::new("Weekly Limit", 37.0));
        usage.extra.insert(
            "subscription".to_string(),
            json!({
                "subscribed": true,
                "plan": {"title": "Andante", "level": "Basic", "status": "Active"},
                "expires_at": "2099-01-01T00:00:00Z",
                "features": [{"feature": "Deep Research", "left": 15, "total": 20}]
            }),
        );
        let output = formatter.format_usage(&usage);
        assert!(output.contains("Subscription:"));
        assert!(output.contains("Plan:     Andante (Basic) Active"));
        assert!(output.contains("Expires:  2099-01-01"));
        assert!(output.contains("Deep Research:"));
        assert!(output.contains("15/20 left"));
    }

    #[test]
    fn test_format_providers() {
        let formatter = TextFormatter::new(false);
        let providers = vec![ConfiguredProvider {
            id: "kimi".to_string(),
            name: "Kimi".to_string(),
            accounts: vec!["personal".to_string(), "work".to_string()],
        }];
        let output = formatter.format_providers(&providers);
        assert!(output.contains("personal, work"));
        assert!(formatter.format_providers(&[]).contains("No providers configured"));
    }
}

#[cfg(test)]
mod waybar_tests {
    use super::super::waybar::{ERROR_CLASS, WaybarOutput, render_error};
    use llmusage_core::{Usage, UsageStats, UsageWindow};
    use serde_json::Value;

    fn stats() -> UsageStats {
        let mut kimi = Usage::new("kimi").with_window(UsageWindow::new("Weekly Limit", 12.0));
        kimi.set_account("work");
        UsageStats::new(vec![
            Usage::new("claude").with_window(UsageWindow::new("5-Hour Window", 45.4)),
            kimi,
            Usage::from_error("zai", "Z.AI", "no credentials"),
        ])
    }

    #[test]
    fn test_text_and_class() {
        let out = WaybarOutput::from_stats(&stats());
        assert_eq!(out.text, "C:45% K:12%");
        assert_eq!(out.class, "normal");
        assert_eq!(out.percentage, 45);
        assert!(out.tooltip.starts_with("LLM Usage\n\n"));
        assert!(out.tooltip.contains("Kimi (work) Weekly Limit: 12.0%"));
        assert!(out.tooltip.contains("Z.AI: no credentials"));
    }

    #[test]
    fn test_critical_and_clamped_percentage() {
        let stats = UsageStats::new(vec![
            Usage::new("claude").with_window(UsageWindow::new("5-Hour Window", 140.0)),
        ]);
        let out = WaybarOutput::from_stats(&stats);
        assert_eq!(out.class, "critical");
        assert_eq!(out.percentage, 100);
    }

    #[test]
    fn test_all_failed_is_error_class() {
        let stats = UsageStats::new(vec![Usage::from_error("claude", "Claude", "boom")]);
        let out = WaybarOutput::from_stats(&stats);
        assert_eq!(out.class, ERROR_CLASS);
        assert_eq!(out.text, "");
    }

    #[test]
    fn test_error_widget_json() {
        let value: Value = serde_json::from_str(&render_error("No providers configured")).unwrap();
        assert_eq!(value["text"], "LLM: Error");
        assert_eq!(value["tooltip"], "No providers configured");
        assert_eq!(value["class"], "error");
        assert_eq!(value["percentage"], 0);
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use llmusage_core::{Usage, UsageStats, UsageWindow};
    use serde_json::Value;

    #[test]
    fn test_stats_shape() {
        let stats = UsageStats::new(vec![
            Usage::new("claude").with_window(UsageWindow::new("5-Hour Window", 45.0)),
        ]);
        let output = JsonFormatter::new(false).format(&stats).unwrap();
        assert!(!output.contains('\n'));

        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["providers"][0]["provider"], "claude");
        assert_eq!(value["providers"][0]["windows"][0]["utilization"], 45.0);
    }

    #[test]
    fn test_pretty() {
        let stats = UsageStats::new(Vec::new());
        let output = JsonFormatter::new(true).format(&stats).unwrap();
        assert_eq!(output, "{\n  \"providers\": []\n}");
    }
}
