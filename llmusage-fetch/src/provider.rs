//! Provider adapter contract.
//!
//! Each vendor implements [`UsageProvider`] over its own client. The fetch
//! core and resolution only ever see trait objects, so nothing outside a
//! vendor module needs to know which vendor it is talking to.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use llmusage_core::Usage;

use crate::error::FetchError;

// ============================================================================
// Usage Provider
// ============================================================================

/// A configured adapter for one provider account.
#[async_trait]
pub trait UsageProvider: Send + Sync {
    /// Human-readable name, used to prefix error messages.
    fn name(&self) -> &str;

    /// Stable provider id, e.g. `"kimi"`.
    fn id(&self) -> &str;

    /// Fetches and normalizes current usage.
    ///
    /// Fails only when the primary usage call fails; secondary lookups are
    /// best-effort.
    async fn get_usage(&self) -> Result<Usage, FetchError>;
}

// ============================================================================
// Provider Instance
// ============================================================================

/// A resolved provider/account pair ready to be fetched.
#[derive(Clone)]
pub struct ProviderInstance {
    /// The adapter, already bound to the account's credential.
    pub provider: Arc<dyn UsageProvider>,
    /// Account name the credential was resolved from.
    pub account: String,
}

impl ProviderInstance {
    /// Creates a new instance.
    pub fn new(provider: Arc<dyn UsageProvider>, account: impl Into<String>) -> Self {
        Self {
            provider,
            account: account.into(),
        }
    }

    /// Returns the provider id.
    pub fn id(&self) -> &str {
        self.provider.id()
    }
}

impl fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("provider", &self.provider.id())
            .field("account", &self.account)
            .finish()
    }
}
