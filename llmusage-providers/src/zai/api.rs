//! Z.AI quota API client.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "data": {
//!     "limits": [
//!       {"type": "TOKENS_LIMIT", "usage": 1000000, "currentValue": 250000,
//!        "remaining": 750000, "percentage": 25, "nextResetTime": 1735707600000}
//!     ]
//!   }
//! }
//! ```

use llmusage_fetch::{FetchError, HttpClient, endpoint};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// Base URL for the Z.AI API.
pub const API_BASE_URL: &str = "https://api.z.ai";

const QUOTA_ENDPOINT: &str = "/api/monitor/usage/quota/limit";

/// Decoded quota response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZaiQuotaResponse {
    /// Payload wrapper.
    #[serde(default)]
    pub data: ZaiQuotaData,
}

/// Payload wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZaiQuotaData {
    /// Individual limits.
    #[serde(default)]
    pub limits: Vec<ZaiLimit>,
}

/// A single limit. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZaiLimit {
    /// Limit kind, e.g. `TOKENS_LIMIT`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Quota size.
    #[serde(default)]
    pub usage: Option<f64>,
    /// Amount consumed.
    #[serde(default)]
    pub current_value: Option<f64>,
    /// Amount left.
    #[serde(default)]
    pub remaining: Option<f64>,
    /// Consumed share, 0-100.
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Next reset (epoch ms).
    #[serde(default)]
    pub next_reset_time: Option<i64>,
}

impl ZaiQuotaResponse {
    /// Decodes a raw body, treating any shape mismatch as "no limits".
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            debug!(error = %e, "Unrecognized Z.AI quota shape");
            Self::default()
        })
    }
}

/// Z.AI client bound to one API key.
#[derive(Debug, Clone)]
pub struct ZaiClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl ZaiClient {
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

    /// Fetches quota limits.
    ///
    /// # Errors
    ///
    /// Transport, status and JSON syntax failures. A well-formed body of an
    /// unexpected shape is not an error.
    #[instrument(skip(self))]
    pub async fn fetch_quota(&self) -> Result<ZaiQuotaResponse, FetchError> {
        let url = endpoint(&self.base_url, QUOTA_ENDPOINT, &[])?;
        let auth = format!("Bearer {}", self.api_key);
        let headers = [
            ("Authorization", auth.as_str()),
            ("Accept", "application/json"),
        ];
        let raw: Value = self.http.get_json(&url, &headers).await?;
        Ok(ZaiQuotaResponse::from_value(raw))
    }
}
