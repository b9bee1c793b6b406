//! MiniMax open-platform API client.

use llmusage_fetch::{FetchError, HttpClient, endpoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the MiniMax platform.
pub const API_BASE_URL: &str = "https://platform.minimax.io";

const CODING_PLAN_ENDPOINT: &str = "/v1/api/openplatform/coding_plan/remains";

const SUBSCRIPTION_ENDPOINT: &str =
    "/v1/api/openplatform/charge/combo/cycle_audio_resource_package";

// ============================================================================
// API Response Structures
// ============================================================================

/// In-band status carried by every response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseResp {
    /// Zero on success.
    #[serde(default)]
    pub status_code: i64,
    /// Vendor message.
    #[serde(default)]
    pub status_msg: String,
}

impl BaseResp {
    /// Whether the vendor reported success.
    pub fn is_ok(&self) -> bool {
        self.status_code == 0
    }
}

/// Response from `coding_plan/remains`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodingPlanResponse {
    /// One entry per model quota.
    #[serde(default)]
    pub model_remains: Vec<ModelRemain>,
    /// In-band status.
    #[serde(default)]
    pub base_resp: BaseResp,
}

/// Quota for one model in the current interval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelRemain {
    /// Interval start (epoch ms).
    #[serde(default)]
    pub start_time: i64,
    /// Interval end (epoch ms).
    #[serde(default)]
    pub end_time: i64,
    /// Time left in the interval (ms).
    #[serde(default)]
    pub remains_time: i64,
    /// Interval quota.
    #[serde(default)]
    pub current_interval_total_count: i64,
    /// Counter reported alongside the quota.
    #[serde(default)]
    pub current_interval_usage_count: i64,
    /// Model name, may be empty.
    #[serde(default)]
    pub model_name: String,
}

/// Response from the subscription package endpoint. Only the status is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    /// In-band status.
    #[serde(default)]
    pub base_resp: BaseResp,
}

// ============================================================================
// API Client
// ============================================================================

/// MiniMax client bound to one cookie and group id.
#[derive(Debug, Clone)]
pub struct MiniMaxClient {
    http: HttpClient,
    base_url: String,
    cookie: String,
    group_id: String,
}

impl MiniMaxClient {
    /// Creates a client against the production platform.
    pub fn new(http: HttpClient, cookie: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            http,
            base_url: API_BASE_URL.to_string(),
            cookie: cookie.into(),
            group_id: group_id.into(),
        }
    }

    /// Points the client at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Secret material identifying this session, for cache key derivation.
    pub fn session_fingerprint(&self) -> String {
        format!("{}{}", self.cookie, self.group_id)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = endpoint(&self.base_url, path, query)?;
        let headers = [
            ("Cookie", self.cookie.as_str()),
            ("Accept", "application/json"),
        ];
        self.http.get_json(&url, &headers).await
    }

    /// Fetches the coding plan quotas.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures, and `FetchError::Api` when
    /// `base_resp` reports a non-zero status.
    #[instrument(skip(self))]
    pub async fn fetch_usage(&self) -> Result<CodingPlanResponse, FetchError> {
        let response: CodingPlanResponse = self
            .get(CODING_PLAN_ENDPOINT, &[("GroupId", self.group_id.as_str())])
            .await?;

        if !response.base_resp.is_ok() {
            return Err(FetchError::Api(format!(
                "status {}: {}",
                response.base_resp.status_code, response.base_resp.status_msg
            )));
        }

        debug!(models = response.model_remains.len(), "Received MiniMax usage");
        Ok(response)
    }

    /// Fetches the subscription package status.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures.
    #[instrument(skip(self))]
    pub async fn fetch_subscription(&self) -> Result<SubscriptionResponse, FetchError> {
        self.get(
            SUBSCRIPTION_ENDPOINT,
            &[
                ("GroupId", self.group_id.as_str()),
                ("biz_line", "2"),
                ("cycle_type", "3"),
                ("resource_package_type", "7"),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coding_plan() {
        let json = r#"{
            "model_remains": [{
                "start_time": 1735689600000,
                "end_time": 1735707600000,
                "remains_time": 3600000,
                "current_interval_total_count": 100,
                "current_interval_usage_count": 80,
                "model_name": "MiniMax-M2"
            }],
            "base_resp": {"status_code": 0, "status_msg": "success"}
        }"#;
        let response: CodingPlanResponse = serde_json::from_str(json).unwrap();
        assert!(response.base_resp.is_ok());
        assert_eq!(response.model_remains[0].model_name, "MiniMax-M2");
        assert_eq!(response.model_remains[0].current_interval_usage_count, 80);
    }

    #[test]
    fn test_missing_base_resp_is_ok() {
        let response: CodingPlanResponse = serde_json::from_str("{}").unwrap();
        assert!(response.base_resp.is_ok());
        assert!(response.model_remains.is_empty());
    }
}
