//! Kimi billing and subscription API client.
//!
//! # Usage Response Format
//!
//! ```json
//! {
//!   "usages": [{
//!     "scope": "FEATURE_CODING",
//!     "detail": {"limit": "100", "used": "37", "resetTime": "2025-01-08T00:00:00Z"},
//!     "limits": [{
//!       "window": {"duration": 5, "timeUnit": "TIME_UNIT_HOURS"},
//!       "detail": {"limit": "50", "used": "10", "resetTime": "2025-01-01T05:00:00Z"}
//!     }]
//!   }]
//! }
//! ```
//!
//! Counters arrive as decimal strings.

use llmusage_fetch::{FetchError, HttpClient, endpoint};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Kimi API.
pub const API_BASE_URL: &str = "https://www.kimi.com";

const USAGE_ENDPOINT: &str = "/apiv2/kimi.gateway.billing.v1.BillingService/GetUsages";

const SUBSCRIPTION_ENDPOINT: &str =
    "/apiv2/kimi.gateway.order.v1.SubscriptionService/GetSubscription";

/// Scope requested from `GetUsages`.
const CODING_SCOPE: &str = "FEATURE_CODING";

// ============================================================================
// Usage Response
// ============================================================================

/// Response from `GetUsages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KimiUsageResponse {
    /// One entry per scope.
    #[serde(default)]
    pub usages: Vec<KimiUsageItem>,
}

/// Usage for one scope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KimiUsageItem {
    /// Scope constant, e.g. `FEATURE_CODING`.
    #[serde(default)]
    pub scope: String,
    /// Scope-level quota.
    #[serde(default)]
    pub detail: KimiUsageDetail,
    /// Rate-limit windows nested under the scope.
    #[serde(default)]
    pub limits: Vec<KimiLimitItem>,
}

/// Counter pair plus reset time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KimiUsageDetail {
    /// Decimal string.
    #[serde(default)]
    pub limit: String,
    /// Decimal string.
    #[serde(default)]
    pub used: String,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub reset_time: String,
}

/// A rate-limit window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KimiLimitItem {
    /// Window length.
    #[serde(default)]
    pub window: KimiWindow,
    /// Counters for this window.
    #[serde(default)]
    pub detail: KimiUsageDetail,
}

/// Window length as duration + unit constant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KimiWindow {
    /// Number of units.
    #[serde(default)]
    pub duration: i64,
    /// Unit constant, e.g. `TIME_UNIT_MINUTE`.
    #[serde(default)]
    pub time_unit: String,
}

// ============================================================================
// Subscription Response
// ============================================================================

/// Response from `GetSubscription`. Cached as-is, hence `Serialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KimiSubscriptionResponse {
    /// Whether the account has an active subscription.
    #[serde(default)]
    pub subscribed: bool,
    /// Current subscription, if any.
    #[serde(default)]
    pub subscription: Option<KimiSubscription>,
    /// Per-feature allowances.
    #[serde(default)]
    pub memberships: Vec<KimiMembership>,
}

/// Subscription details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KimiSubscription {
    /// Subscription id.
    #[serde(default)]
    pub subscription_id: String,
    /// End of the current billing period (RFC 3339).
    #[serde(default)]
    pub current_end_time: String,
    /// Status constant, e.g. `SUBSCRIPTION_STATUS_ACTIVE`.
    #[serde(default)]
    pub status: String,
    /// Purchased plan.
    #[serde(default)]
    pub goods: KimiGoods,
}

/// Purchased plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KimiGoods {
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Level constant, e.g. `LEVEL_BASIC`.
    #[serde(default)]
    pub membership_level: String,
}

/// Allowance for one feature. Counts may be numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KimiMembership {
    /// Feature constant, e.g. `FEATURE_CODING`.
    #[serde(default)]
    pub feature: String,
    /// Remaining allowance.
    #[serde(default)]
    pub left_count: Value,
    /// Total allowance.
    #[serde(default)]
    pub total_count: Value,
}

// ============================================================================
// API Client
// ============================================================================

/// Kimi API client bound to one API key.
#[derive(Debug, Clone)]
pub struct KimiClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl KimiClient {
    /// Creates a client against the production API.
    pub fn new(http: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: API_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Points the client at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns the API key (for cache key derivation).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, FetchError> {
        let url = endpoint(&self.base_url, path, &[])?;
        let auth = format!("Bearer {}", self.api_key);
        let headers = [
            ("Authorization", auth.as_str()),
            ("Accept", "application/json"),
        ];
        self.http.post_json(&url, &headers, body).await
    }

    /// Fetches coding usage.
    ///
    /// # Errors
    ///
    /// Any transport, status or decode failure.
    #[instrument(skip(self))]
    pub async fn fetch_usage(&self) -> Result<KimiUsageResponse, FetchError> {
        let usage: KimiUsageResponse = self
            .post(USAGE_ENDPOINT, &json!({ "scope": [CODING_SCOPE] }))
            .await?;
        debug!(scopes = usage.usages.len(), "Received Kimi usage");
        Ok(usage)
    }

    /// Fetches subscription details.
    ///
    /// # Errors
    ///
    /// Any transport, status or decode failure.
    #[instrument(skip(self))]
    pub async fn fetch_subscription(&self) -> Result<KimiSubscriptionResponse, FetchError> {
        self.post(SUBSCRIPTION_ENDPOINT, &json!({})).await
    }
}
