//! Concurrent fetch across resolved provider instances.
//!
//! One task per instance, each producing exactly the value for its own
//! slot. The join is a full barrier: a failing or panicking provider never
//! cancels its siblings, and output order is resolution order regardless
//! of completion order.

use futures::future::join_all;
use llmusage_core::{Usage, UsageStats};
use tracing::{Instrument, debug, info_span, warn};

use crate::provider::{ProviderInstance, UsageProvider};

/// Account name that is never written into [`Usage::extra`].
const DEFAULT_ACCOUNT: &str = "default";

/// Fetches usage for every instance concurrently.
pub async fn fetch_all(instances: &[ProviderInstance]) -> UsageStats {
    debug!(count = instances.len(), "Fetching usage");

    let handles: Vec<_> = instances
        .iter()
        .enumerate()
        .map(|(slot, instance)| {
            let provider = instance.provider.clone();
            let account = instance.account.clone();
            let span = info_span!("fetch", slot, provider = %provider.id(), account = %account);
            tokio::spawn(async move { fetch_one(provider.as_ref(), &account).await }.instrument(span))
        })
        .collect();

    let mut slots: Vec<Option<Usage>> = vec![None; instances.len()];
    for (slot, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(usage) => slots[slot] = Some(usage),
            Err(e) => warn!(slot, error = %e, "Fetch task did not complete"),
        }
    }

    let providers: Vec<Usage> = slots
        .into_iter()
        .flatten()
        .filter(|u| !u.provider_id.is_empty())
        .collect();
    debug!(
        total = providers.len(),
        failed = providers.iter().filter(|u| u.is_error()).count(),
        "Fetch complete"
    );
    UsageStats::new(providers)
}

async fn fetch_one(provider: &dyn UsageProvider, account: &str) -> Usage {
    match provider.get_usage().await {
        Ok(mut usage) => {
            if !account.is_empty() && account != DEFAULT_ACCOUNT {
                usage.set_account(account);
            }
            usage
        }
        Err(e) => {
            debug!(error = %e, "Provider fetch failed");
            Usage::from_error(provider.id(), provider.name(), e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use llmusage_core::UsageWindow;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    enum Behavior {
        Ok(f64),
        Fail,
        Panic,
        EmptyId,
        Sleep(u64, f64),
    }

    struct FakeProvider {
        id: &'static str,
        behavior: Behavior,
    }

    #[async_trait]
    impl UsageProvider for FakeProvider {
        fn name(&self) -> &str {
            "Fake"
        }

        fn id(&self) -> &str {
            self.id
        }

        async fn get_usage(&self) -> Result<Usage, FetchError> {
            match self.behavior {
                Behavior::Ok(util) => {
                    Ok(Usage::new(self.id).with_window(UsageWindow::new("w", util)))
                }
                Behavior::Fail => Err(FetchError::status(500, "boom")),
                Behavior::Panic => panic!("provider bug"),
                Behavior::EmptyId => Ok(Usage::default()),
                Behavior::Sleep(ms, util) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(Usage::new(self.id).with_window(UsageWindow::new("w", util)))
                }
            }
        }
    }

    fn instance(id: &'static str, account: &str, behavior: Behavior) -> ProviderInstance {
        ProviderInstance::new(Arc::new(FakeProvider { id, behavior }), account)
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_all_slots() {
        let instances = vec![
            instance("claude", "", Behavior::Ok(10.0)),
            instance("kimi", "", Behavior::Fail),
            instance("zai", "", Behavior::Ok(30.0)),
        ];
        let stats = fetch_all(&instances).await;

        assert_eq!(stats.providers.len(), 3);
        assert!(stats.providers[0].error.is_none());
        assert_eq!(stats.providers[0].windows.len(), 1);
        assert_eq!(
            stats.providers[1].error.as_deref(),
            Some("Fake: API returned status 500: boom")
        );
        assert!(stats.providers[1].windows.is_empty());
        assert_eq!(stats.providers[1].provider_id, "kimi");
        assert_eq!(stats.providers[2].windows.len(), 1);
    }

    #[tokio::test]
    async fn test_order_follows_resolution_not_completion() {
        let instances = vec![
            instance("claude", "", Behavior::Sleep(150, 1.0)),
            instance("kimi", "", Behavior::Sleep(10, 2.0)),
            instance("zai", "", Behavior::Sleep(80, 3.0)),
        ];
        let stats = fetch_all(&instances).await;
        let ids: Vec<_> = stats.providers.iter().map(|u| u.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["claude", "kimi", "zai"]);
    }

    #[tokio::test]
    async fn test_fetches_run_in_parallel() {
        let instances: Vec<_> = (0..5)
            .map(|_| instance("kimi", "", Behavior::Sleep(200, 1.0)))
            .collect();
        let start = Instant::now();
        let stats = fetch_all(&instances).await;
        assert_eq!(stats.providers.len(), 5);
        assert!(start.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_account_injection() {
        let instances = vec![
            instance("kimi", "work", Behavior::Ok(1.0)),
            instance("kimi", "default", Behavior::Ok(1.0)),
            instance("kimi", "", Behavior::Ok(1.0)),
            instance("kimi", "work", Behavior::Fail),
        ];
        let stats = fetch_all(&instances).await;

        assert_eq!(stats.providers[0].account(), Some("work"));
        assert_eq!(stats.providers[1].account(), None);
        assert_eq!(stats.providers[2].account(), None);
        assert!(stats.providers[3].extra.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_task_and_empty_id_are_dropped() {
        let instances = vec![
            instance("claude", "", Behavior::Ok(1.0)),
            instance("kimi", "", Behavior::Panic),
            instance("zai", "", Behavior::EmptyId),
            instance("minimax", "", Behavior::Ok(2.0)),
        ];
        let stats = fetch_all(&instances).await;
        let ids: Vec<_> = stats.providers.iter().map(|u| u.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["claude", "minimax"]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let stats = fetch_all(&[]).await;
        assert!(stats.is_empty());
    }
}
