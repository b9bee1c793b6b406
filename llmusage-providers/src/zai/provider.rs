//! Z.AI usage adapter.

use async_trait::async_trait;
use chrono::DateTime;
use llmusage_core::{ProviderKind, Usage, UsageWindow};
use llmusage_fetch::{FetchError, UsageProvider};

use super::api::{ZaiClient, ZaiLimit, ZaiQuotaResponse};

/// Adapter normalizing Z.AI quota limits.
#[derive(Debug, Clone)]
pub struct ZaiProvider {
    client: ZaiClient,
}

impl ZaiProvider {
    /// Creates an adapter over a client.
    pub fn new(client: ZaiClient) -> Self {
        Self { client }
    }
}

/// `TOKENS_LIMIT` -> `Tokens Limit`.
fn limit_label(kind: &str) -> String {
    if kind.is_empty() {
        return "Quota".to_string();
    }
    kind.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let lower = part.to_lowercase();
            let mut chars = lower.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn window_from_limit(limit: &ZaiLimit) -> UsageWindow {
    let utilization = match (limit.percentage, limit.usage, limit.current_value) {
        (Some(pct), _, _) => pct,
        (None, Some(total), Some(used)) if total > 0.0 => used / total * 100.0,
        _ => 0.0,
    };

    let mut window = UsageWindow::new(limit_label(&limit.kind), utilization.max(0.0))
        .with_resets_at(limit.next_reset_time.and_then(DateTime::from_timestamp_millis));
    window.limit = limit.usage;
    window.used = limit.current_value;
    window.remaining = limit.remaining;
    window
}

/// Maps the quota response into one window per limit.
pub(crate) fn normalize(response: &ZaiQuotaResponse) -> Usage {
    let mut usage = Usage::new(ProviderKind::Zai.id());
    usage
        .windows
        .extend(response.data.limits.iter().map(window_from_limit));
    usage
}

#[async_trait]
impl UsageProvider for ZaiProvider {
    fn name(&self) -> &str {
        ProviderKind::Zai.display_name()
    }

    fn id(&self) -> &str {
        ProviderKind::Zai.id()
    }

    async fn get_usage(&self) -> Result<Usage, FetchError> {
        let response = self.client.fetch_quota().await?;
        Ok(normalize(&response))
    }
}
