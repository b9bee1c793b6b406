// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llm-usage Providers
//!
//! Vendor clients, usage adapters and provider resolution.
//!
//! Each vendor module has two layers:
//!
//! - **Client**: typed access to the vendor's HTTP API, with a base URL
//!   override for tests
//! - **Provider**: a [`UsageProvider`](llmusage_fetch::UsageProvider)
//!   that normalizes the response into [`Usage`](llmusage_core::Usage)
//!
//! | Provider | Credential | Secondary lookup |
//! |----------|------------|------------------|
//! | Claude | OAuth token (store or Claude CLI) | none |
//! | Kimi | API key | subscription (cached) |
//! | Z.AI | API key | none |
//! | MiniMax | session cookie + group id | subscription (cached) |
//!
//! ## Usage
//!
//! ```ignore
//! use llmusage_fetch::{HttpClient, fetch_all};
//! use llmusage_providers::{ProviderContext, ProviderResolver};
//! use llmusage_store::{CacheManager, CredentialStore};
//!
//! let ctx = ProviderContext::new(HttpClient::new(), CacheManager::open_default());
//! let resolver = ProviderResolver::new(CredentialStore::open_default(), ctx);
//! let instances = resolver.resolve("all", "", false).await;
//! let stats = fetch_all(&instances).await;
//! ```

pub mod claude;
pub mod context;
pub mod kimi;
pub mod minimax;
pub mod resolve;
pub mod zai;

#[cfg(test)]
mod test_support;

pub use context::{DEFAULT_SUBSCRIPTION_TTL, ProviderContext};
pub use resolve::{ALL_PROVIDERS, ConfiguredProvider, ProviderResolver};
