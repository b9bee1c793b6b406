//! Usage-related types.
//!
//! This module contains the normalized usage model every provider maps into:
//! - [`Usage`] - One provider/account result
//! - [`UsageWindow`] - Individual quota or rate-limit bucket
//! - [`UsageStats`] - Aggregate over all resolved instances
//! - [`Severity`] - Threshold classification of the aggregate

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Utilization at or above which the aggregate is "warning".
pub const WARNING_THRESHOLD: f64 = 75.0;

/// Utilization at or above which the aggregate is "critical".
pub const CRITICAL_THRESHOLD: f64 = 90.0;

/// Key under which the fan-out records the account name in [`Usage::extra`].
pub const ACCOUNT_KEY: &str = "account";

// ============================================================================
// Usage
// ============================================================================

/// Normalized usage result for one provider account.
///
/// When `error` is set the fetch failed and `windows`/`extra` are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Provider id, e.g. `"claude"`.
    #[serde(rename = "provider")]
    pub provider_id: String,
    /// Windows in the order the provider reported them.
    #[serde(default)]
    pub windows: Vec<UsageWindow>,
    /// Provider-specific annexes (subscription, credits, account label).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Usage {
    /// Creates an empty successful result for the given provider.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            ..Self::default()
        }
    }

    /// Creates an error result, prefixing the message with the display name.
    pub fn from_error(
        provider_id: impl Into<String>,
        display_name: &str,
        error: impl fmt::Display,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            windows: Vec::new(),
            extra: Map::new(),
            error: Some(format!("{display_name}: {error}")),
        }
    }

    /// Creates the error result for a provider without credentials.
    pub fn not_configured(provider_id: impl Into<String>, display_name: &str) -> Self {
        Self::from_error(provider_id, display_name, "not configured")
    }

    /// Appends a window.
    pub fn with_window(mut self, window: UsageWindow) -> Self {
        self.windows.push(window);
        self
    }

    /// Returns true if this result carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the account label injected by the fan-out, if any.
    pub fn account(&self) -> Option<&str> {
        self.extra.get(ACCOUNT_KEY).and_then(Value::as_str)
    }

    /// Records the account label.
    pub fn set_account(&mut self, account: &str) {
        self.extra
            .insert(ACCOUNT_KEY.to_string(), Value::String(account.to_string()));
    }

    /// Returns the highest window utilization, 0 when there are no windows.
    pub fn max_utilization(&self) -> f64 {
        self.windows
            .iter()
            .map(|w| w.utilization)
            .fold(0.0_f64, f64::max)
    }

    /// Returns the first window, which status-bar output treats as primary.
    pub fn primary_window(&self) -> Option<&UsageWindow> {
        self.windows.first()
    }

    /// Validates every window.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` naming the first invalid window.
    pub fn validate(&self) -> Result<(), CoreError> {
        for window in &self.windows {
            window
                .validate()
                .map_err(|e| CoreError::InvalidData(format!("window {:?}: {e}", window.label)))?;
        }
        Ok(())
    }
}

// ============================================================================
// Usage Window
// ============================================================================

/// A single quota or rate-limit bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    /// Human-readable label, e.g. "5-Hour".
    pub label: String,
    /// Percentage of the quota consumed (0-100).
    pub utilization: f64,
    /// When this window resets, if known.
    pub resets_at: Option<DateTime<Utc>>,
    /// Absolute limit, for count-based providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    /// Absolute amount used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<f64>,
    /// Absolute amount (or time) remaining.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
}

impl UsageWindow {
    /// Creates a window with only a label and utilization.
    pub fn new(label: impl Into<String>, utilization: f64) -> Self {
        Self {
            label: label.into(),
            utilization,
            resets_at: None,
            limit: None,
            used: None,
            remaining: None,
        }
    }

    /// Sets the reset time.
    pub fn with_resets_at(mut self, resets_at: Option<DateTime<Utc>>) -> Self {
        self.resets_at = resets_at;
        self
    }

    /// Sets the absolute counters.
    pub fn with_counts(mut self, limit: f64, used: f64, remaining: f64) -> Self {
        self.limit = Some(limit);
        self.used = Some(used);
        self.remaining = Some(remaining);
        self
    }

    /// Returns time until reset, if known. Negative once the reset passed.
    pub fn time_until_reset(&self) -> Option<Duration> {
        self.resets_at.map(|reset| reset - Utc::now())
    }

    /// Validates the window data.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if `utilization` is not finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.utilization.is_finite() {
            return Err(CoreError::InvalidData(
                "utilization is not a finite number".to_string(),
            ));
        }
        if self.utilization < 0.0 {
            return Err(CoreError::InvalidData(format!(
                "utilization {} is negative",
                self.utilization
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Threshold classification used by status-bar output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Below the warning threshold.
    Normal,
    /// At or above 75%.
    Warning,
    /// At or above 90%.
    Critical,
}

impl Severity {
    /// Classifies a utilization percentage.
    pub fn from_utilization(utilization: f64) -> Self {
        if utilization >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if utilization >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    /// Returns the CSS class name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Usage Stats
// ============================================================================

/// Aggregate of all fetched provider accounts, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// One entry per resolved instance.
    pub providers: Vec<Usage>,
}

impl UsageStats {
    /// Wraps a list of results.
    pub fn new(providers: Vec<Usage>) -> Self {
        Self { providers }
    }

    /// Returns true when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns true when at least one entry exists and every entry failed.
    pub fn all_failed(&self) -> bool {
        !self.providers.is_empty() && self.providers.iter().all(Usage::is_error)
    }

    /// Highest window utilization across successful entries.
    pub fn max_utilization(&self) -> f64 {
        self.providers
            .iter()
            .filter(|u| !u.is_error())
            .map(Usage::max_utilization)
            .fold(0.0_f64, f64::max)
    }

    /// Classifies [`Self::max_utilization`].
    pub fn severity(&self) -> Severity {
        Severity::from_utilization(self.max_utilization())
    }

    /// Returns the first entry for the given provider id.
    pub fn provider_by_id(&self, id: &str) -> Option<&Usage> {
        self.providers.iter().find(|u| u.provider_id == id)
    }

    /// Iterates over entries that carry an error.
    pub fn errors(&self) -> impl Iterator<Item = &Usage> {
        self.providers.iter().filter(|u| u.is_error())
    }
}
