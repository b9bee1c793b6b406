//! Shared resources handed to every adapter.

use std::future::Future;
use std::time::Duration;

use llmusage_fetch::{FetchError, HttpClient};
use llmusage_store::CacheManager;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// Default lifetime of cached subscription lookups.
pub const DEFAULT_SUBSCRIPTION_TTL: Duration = Duration::from_secs(30 * 60);

/// HTTP client, cache and cache policy shared across adapters.
///
/// Cloning is cheap; the HTTP client shares its connection pool.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    /// Client used for every vendor call.
    pub http: HttpClient,
    /// Cache for secondary lookups.
    pub cache: CacheManager,
    /// How long subscription lookups stay cached.
    pub subscription_ttl: Duration,
}

impl ProviderContext {
    /// Creates a context with the default TTL.
    pub fn new(http: HttpClient, cache: CacheManager) -> Self {
        Self {
            http,
            cache,
            subscription_ttl: DEFAULT_SUBSCRIPTION_TTL,
        }
    }

    /// Overrides the subscription TTL.
    pub fn with_subscription_ttl(mut self, ttl: Duration) -> Self {
        self.subscription_ttl = ttl;
        self
    }

    /// Best-effort cached lookup for secondary data.
    ///
    /// Returns the cached value under `key` if live, otherwise runs `fetch`
    /// and stores a success for [`Self::subscription_ttl`]. Fetch and cache
    /// failures are logged and yield `None`; they never fail the caller.
    pub async fn cached<T, F, Fut>(&self, key: &str, fetch: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if let Some(hit) = self.cache.get::<T>(key).await {
            return Some(hit);
        }

        let value = match fetch().await {
            Ok(value) => value,
            Err(e) => {
                debug!(key, error = %e, "Secondary lookup failed, skipping");
                return None;
            }
        };

        if let Err(e) = self.cache.set(key, &value, self.subscription_ttl).await {
            debug!(key, error = %e, "Failed to cache secondary lookup");
        }
        Some(value)
    }
}

impl Default for ProviderContext {
    fn default() -> Self {
        Self::new(HttpClient::new(), CacheManager::open_default())
    }
}
