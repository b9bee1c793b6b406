//! CLI command implementations.

pub mod accounts;
pub mod cache;
pub mod config;
pub mod providers;
pub mod serve;
pub mod usage;

use llmusage_fetch::HttpClient;
use llmusage_providers::{ProviderContext, ProviderResolver};
use llmusage_store::{CacheManager, CredentialStore, Settings};

/// Builds a resolver over the default store and cache, honouring settings.
pub fn default_resolver(settings: &Settings) -> ProviderResolver {
    let ctx = ProviderContext::new(HttpClient::new(), CacheManager::open_default())
        .with_subscription_ttl(settings.subscription_cache_ttl());
    ProviderResolver::new(CredentialStore::open_default(), ctx)
}

/// Provider filter from the flag, else the configured default.
pub fn provider_filter<'a>(flag: Option<&'a str>, settings: &'a Settings) -> &'a str {
    flag.unwrap_or(&settings.default_provider)
}
