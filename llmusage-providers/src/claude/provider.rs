//! Claude usage adapter.

use async_trait::async_trait;
use llmusage_core::{ProviderKind, Usage, UsageWindow};
use llmusage_fetch::{FetchError, UsageProvider};
use serde_json::json;

use super::api::{ClaudeClient, ClaudeUsageResponse};

/// Adapter normalizing the Claude OAuth usage response.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    client: ClaudeClient,
}

impl ClaudeProvider {
    /// Creates an adapter over a client.
    pub fn new(client: ClaudeClient) -> Self {
        Self { client }
    }
}

/// Maps the raw response into the normalized model.
pub(crate) fn normalize(response: &ClaudeUsageResponse) -> Usage {
    let mut usage = Usage::new(ProviderKind::Claude.id());

    for (label, window) in response.labeled_windows() {
        usage.windows.push(
            UsageWindow::new(label, window.utilization).with_resets_at(window.resets_at()),
        );
    }

    if let Some(extra) = response.extra_usage.as_ref().filter(|e| e.is_enabled) {
        usage.extra.insert(
            "extra_usage".to_string(),
            json!({
                "utilization": extra.utilization,
                "used_credits": extra.used_credits,
                "monthly_limit": extra.monthly_limit,
            }),
        );
    }

    usage
}

#[async_trait]
impl UsageProvider for ClaudeProvider {
    fn name(&self) -> &str {
        ProviderKind::Claude.display_name()
    }

    fn id(&self) -> &str {
        ProviderKind::Claude.id()
    }

    async fn get_usage(&self) -> Result<Usage, FetchError> {
        let response = self.client.fetch_usage().await?;
        Ok(normalize(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_mock;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::get};
    use llmusage_fetch::HttpClient;
    use serde_json::Value;

    fn usage_body() -> Value {
        json!({
            "five_hour": {"utilization": 42.0, "resets_at": "2030-01-01T05:00:00+00:00"},
            "seven_day": {"utilization": 12.5, "resets_at": "2030-01-07T00:00:00+00:00"},
            "seven_day_oauth_apps": null,
            "seven_day_opus": {"utilization": 3.0, "resets_at": null},
            "seven_day_sonnet": null,
            "iguana_necktie": null,
            "extra_usage": {"is_enabled": false}
        })
    }

    #[tokio::test]
    async fn test_get_usage_maps_windows_in_order() {
        let app = Router::new().route(
            "/api/oauth/usage",
            get(|headers: HeaderMap| async move {
                let authorized = headers.get("authorization").and_then(|v| v.to_str().ok())
                    == Some("Bearer tok")
                    && headers.get("anthropic-beta").and_then(|v| v.to_str().ok())
                        == Some("oauth-2025-04-20");
                if authorized {
                    (StatusCode::OK, Json(usage_body()))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad token"})))
                }
            }),
        );
        let base = spawn_mock(app).await;

        let provider =
            ClaudeProvider::new(ClaudeClient::new(HttpClient::new(), "tok").with_base_url(&base));
        let usage = provider.get_usage().await.unwrap();

        assert_eq!(usage.provider_id, "claude");
        let labels: Vec<_> = usage.windows.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["5-Hour", "7-Day", "7-Day Opus"]);
        assert!((usage.windows[0].utilization - 42.0).abs() < f64::EPSILON);
        assert!(usage.windows[0].resets_at.is_some());
        assert!(usage.windows[2].resets_at.is_none());
        assert!(usage.windows[0].limit.is_none());
        assert!(usage.extra.is_empty());

        let bad =
            ClaudeProvider::new(ClaudeClient::new(HttpClient::new(), "wrong").with_base_url(&base));
        let err = bad.get_usage().await.unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_extra_usage_when_enabled() {
        let response: ClaudeUsageResponse = serde_json::from_value(json!({
            "five_hour": {"utilization": 1.0},
            "extra_usage": {"is_enabled": true, "monthly_limit": 5000.0, "used_credits": 1250.0, "utilization": 25.0}
        }))
        .unwrap();

        let usage = normalize(&response);
        let extra = &usage.extra["extra_usage"];
        assert_eq!(extra["utilization"], 25.0);
        assert_eq!(extra["used_credits"], 1250.0);
        assert_eq!(extra["monthly_limit"], 5000.0);
    }

    #[test]
    fn test_all_windows_null() {
        let usage = normalize(&ClaudeUsageResponse::default());
        assert!(usage.windows.is_empty());
        assert!(usage.error.is_none());
    }
}
