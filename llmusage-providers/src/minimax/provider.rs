//! MiniMax usage adapter.

use async_trait::async_trait;
use chrono::DateTime;
use llmusage_core::{ProviderKind, Usage, UsageWindow};
use llmusage_fetch::{FetchError, UsageProvider};
use llmusage_store::hash_key;
use serde_json::json;

use super::api::{CodingPlanResponse, MiniMaxClient, ModelRemain, SubscriptionResponse};
use crate::context::ProviderContext;

const SUBSCRIPTION_CACHE_PREFIX: &str = "minimax_subscription";

/// Label used when the vendor omits the model name.
const FALLBACK_LABEL: &str = "MiniMax";

/// Adapter normalizing MiniMax coding plan quotas.
#[derive(Debug, Clone)]
pub struct MiniMaxProvider {
    client: MiniMaxClient,
    ctx: ProviderContext,
}

impl MiniMaxProvider {
    /// Creates an adapter over a client.
    pub fn new(client: MiniMaxClient, ctx: ProviderContext) -> Self {
        Self { client, ctx }
    }

    async fn subscription(&self) -> Option<SubscriptionResponse> {
        let key = hash_key(SUBSCRIPTION_CACHE_PREFIX, &self.client.session_fingerprint());
        self.ctx
            .cached(&key, || self.client.fetch_subscription())
            .await
    }
}

// The vendor's usage counter is reported against the remaining quota, so
// utilization is derived from (total - used). Keep it that way.
#[allow(clippy::cast_precision_loss)]
fn window_from_remain(item: &ModelRemain) -> UsageWindow {
    let total = item.current_interval_total_count as f64;
    let used = item.current_interval_usage_count as f64;
    let utilization = if total > 0.0 {
        (total - used) / total * 100.0
    } else {
        0.0
    };

    let label = if item.model_name.is_empty() {
        FALLBACK_LABEL
    } else {
        item.model_name.as_str()
    };

    UsageWindow::new(label, utilization)
        .with_resets_at(DateTime::from_timestamp_millis(item.end_time))
        .with_counts(total, used, item.remains_time as f64)
}

/// Maps the coding plan response into one window per model.
pub(crate) fn normalize(response: &CodingPlanResponse) -> Usage {
    let mut usage = Usage::new(ProviderKind::MiniMax.id());
    usage
        .windows
        .extend(response.model_remains.iter().map(window_from_remain));
    usage
}

#[async_trait]
impl UsageProvider for MiniMaxProvider {
    fn name(&self) -> &str {
        ProviderKind::MiniMax.display_name()
    }

    fn id(&self) -> &str {
        ProviderKind::MiniMax.id()
    }

    async fn get_usage(&self) -> Result<Usage, FetchError> {
        let response = self.client.fetch_usage().await?;
        let mut usage = normalize(&response);

        if let Some(sub) = self.subscription().await {
            usage.extra.insert(
                "subscription".to_string(),
                json!({ "status": sub.base_resp.status_msg }),
            );
        }

        Ok(usage)
    }
}
