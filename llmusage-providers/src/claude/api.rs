//! Claude OAuth usage API client.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "five_hour": {"utilization": 25.0, "resets_at": "2025-01-01T12:00:00+00:00"},
//!   "seven_day": {"utilization": 45.0, "resets_at": "2025-01-05T00:00:00+00:00"},
//!   "seven_day_opus": null,
//!   "extra_usage": {"is_enabled": true, "used_credits": 500, "monthly_limit": 10000}
//! }
//! ```

use chrono::{DateTime, Utc};
use llmusage_fetch::{FetchError, HttpClient, endpoint};
use serde::Deserialize;
use tracing::{debug, instrument};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Anthropic API.
pub const API_BASE_URL: &str = "https://api.anthropic.com";

/// OAuth usage endpoint.
const USAGE_ENDPOINT: &str = "/api/oauth/usage";

/// Beta header value required by the OAuth endpoints.
const OAUTH_BETA: &str = "oauth-2025-04-20";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the OAuth usage endpoint. Every window is nullable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeUsageResponse {
    /// Rolling 5-hour window.
    #[serde(default)]
    pub five_hour: Option<ClaudeUsageWindow>,
    /// 7-day window across all models.
    #[serde(default)]
    pub seven_day: Option<ClaudeUsageWindow>,
    /// 7-day window for OAuth apps.
    #[serde(default)]
    pub seven_day_oauth_apps: Option<ClaudeUsageWindow>,
    /// 7-day Opus window.
    #[serde(default)]
    pub seven_day_opus: Option<ClaudeUsageWindow>,
    /// 7-day Sonnet window.
    #[serde(default)]
    pub seven_day_sonnet: Option<ClaudeUsageWindow>,
    /// Experimental window under an internal codename.
    #[serde(default)]
    pub iguana_necktie: Option<ClaudeUsageWindow>,
    /// Pay-as-you-go credits beyond the subscription.
    #[serde(default)]
    pub extra_usage: Option<ClaudeExtraUsage>,
}

impl ClaudeUsageResponse {
    /// Returns the present windows with their labels, in display order.
    pub fn labeled_windows(&self) -> impl Iterator<Item = (&'static str, &ClaudeUsageWindow)> {
        [
            ("5-Hour", &self.five_hour),
            ("7-Day", &self.seven_day),
            ("7-Day OAuth Apps", &self.seven_day_oauth_apps),
            ("7-Day Opus", &self.seven_day_opus),
            ("7-Day Sonnet", &self.seven_day_sonnet),
            ("Iguana Necktie", &self.iguana_necktie),
        ]
        .into_iter()
        .filter_map(|(label, window)| window.as_ref().map(|w| (label, w)))
    }
}

/// A single utilization window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeUsageWindow {
    /// Utilization percentage (0-100).
    #[serde(default)]
    pub utilization: f64,
    /// When this window resets (RFC 3339).
    #[serde(default)]
    pub resets_at: Option<String>,
}

impl ClaudeUsageWindow {
    /// Parses the reset timestamp, ignoring malformed values.
    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        self.resets_at.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
    }
}

/// Extra usage (credits) information.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeExtraUsage {
    /// Whether extra usage is enabled on the account.
    #[serde(default)]
    pub is_enabled: bool,
    /// Monthly credit limit.
    #[serde(default)]
    pub monthly_limit: Option<f64>,
    /// Credits used this month.
    #[serde(default)]
    pub used_credits: Option<f64>,
    /// Credits used as a percentage of the limit.
    #[serde(default)]
    pub utilization: Option<f64>,
}

// ============================================================================
// API Client
// ============================================================================

/// Claude OAuth usage client bound to one access token.
#[derive(Debug, Clone)]
pub struct ClaudeClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
}

impl ClaudeClient {
    /// Creates a client against the production API.
    pub fn new(http: HttpClient, access_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: API_BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Points the client at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the usage windows.
    ///
    /// # Errors
    ///
    /// Any transport, status or decode failure.
    #[instrument(skip(self))]
    pub async fn fetch_usage(&self) -> Result<ClaudeUsageResponse, FetchError> {
        let url = endpoint(&self.base_url, USAGE_ENDPOINT, &[])?;
        let auth = format!("Bearer {}", self.access_token);
        let headers = [
            ("Authorization", auth.as_str()),
            ("anthropic-beta", OAUTH_BETA),
            ("Accept", "application/json"),
            ("Content-Type", "application/json"),
        ];

        let usage: ClaudeUsageResponse = self.http.get_json(&url, &headers).await?;
        debug!(windows = usage.labeled_windows().count(), "Received Claude usage");
        Ok(usage)
    }
}
