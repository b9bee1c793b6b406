//! Kimi usage adapter.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use llmusage_core::{ProviderKind, Usage, UsageWindow};
use llmusage_fetch::{FetchError, UsageProvider};
use llmusage_store::hash_key;
use serde_json::{Value, json};
use tracing::debug;

use super::api::{KimiClient, KimiSubscriptionResponse, KimiUsageDetail, KimiUsageResponse};
use super::labels;
use crate::context::ProviderContext;

/// Cache key prefix for subscription lookups.
const SUBSCRIPTION_CACHE_PREFIX: &str = "kimi_subscription";

/// Adapter normalizing Kimi usage plus cached subscription details.
#[derive(Debug, Clone)]
pub struct KimiProvider {
    client: KimiClient,
    ctx: ProviderContext,
}

impl KimiProvider {
    /// Creates an adapter over a client.
    pub fn new(client: KimiClient, ctx: ProviderContext) -> Self {
        Self { client, ctx }
    }

    async fn subscription(&self) -> Option<KimiSubscriptionResponse> {
        let key = hash_key(SUBSCRIPTION_CACHE_PREFIX, self.client.api_key());
        self.ctx
            .cached(&key, || self.client.fetch_subscription())
            .await
    }
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Builds a window from string counters. Unparseable counters drop the window.
fn window_from_detail(label: String, detail: &KimiUsageDetail) -> Option<UsageWindow> {
    let limit: f64 = detail.limit.trim().parse().ok()?;
    let used: f64 = detail.used.trim().parse().ok()?;
    let utilization = if limit > 0.0 { used / limit * 100.0 } else { 0.0 };

    Some(
        UsageWindow::new(label, utilization)
            .with_resets_at(parse_rfc3339(&detail.reset_time))
            .with_counts(limit, used, limit - used),
    )
}

/// Maps the usage response into windows: each scope, then its rate limits.
pub(crate) fn normalize(response: &KimiUsageResponse) -> Usage {
    let mut usage = Usage::new(ProviderKind::Kimi.id());

    for item in &response.usages {
        let scope = labels::scope_label(&item.scope);
        match window_from_detail(scope, &item.detail) {
            Some(window) => usage.windows.push(window),
            None => debug!(scope = %item.scope, "Skipping scope with unparseable counters"),
        }

        for limit in &item.limits {
            let label = labels::rate_limit_label(limit.window.duration, &limit.window.time_unit);
            if let Some(window) = window_from_detail(label, &limit.detail) {
                usage.windows.push(window);
            }
        }
    }

    usage
}

/// Shapes subscription details for [`Usage::extra`].
pub(crate) fn subscription_extra(sub: &KimiSubscriptionResponse) -> Value {
    let mut extra = json!({ "subscribed": sub.subscribed });

    if let Some(current) = &sub.subscription {
        extra["plan"] = json!({
            "title": current.goods.title,
            "level": labels::membership_level(&current.goods.membership_level),
            "status": labels::subscription_status(&current.status),
        });
        if let Some(expires) = parse_rfc3339(&current.current_end_time) {
            extra["expires_at"] = json!(expires.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }

    if !sub.memberships.is_empty() {
        let features: Vec<Value> = sub
            .memberships
            .iter()
            .map(|m| {
                json!({
                    "feature": labels::feature_name(&m.feature),
                    "left": m.left_count,
                    "total": m.total_count,
                })
            })
            .collect();
        extra["features"] = Value::Array(features);
    }

    extra
}

#[async_trait]
impl UsageProvider for KimiProvider {
    fn name(&self) -> &str {
        ProviderKind::Kimi.display_name()
    }

    fn id(&self) -> &str {
        ProviderKind::Kimi.id()
    }

    async fn get_usage(&self) -> Result<Usage, FetchError> {
        let response = self.client.fetch_usage().await?;
        let mut usage = normalize(&response);

        if let Some(sub) = self.subscription().await {
            usage
                .extra
                .insert("subscription".to_string(), subscription_extra(&sub));
        }

        Ok(usage)
    }
}
