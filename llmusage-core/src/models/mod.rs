//! Domain models for llm-usage.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider identity (`ProviderKind`)
//! - [`usage`] - Normalized usage (`Usage`, `UsageWindow`, `UsageStats`)

mod provider;
mod usage;

pub use provider::{ProviderKind, display_name_for, short_name_for};
pub use usage::{
    ACCOUNT_KEY, CRITICAL_THRESHOLD, Severity, Usage, UsageStats, UsageWindow, WARNING_THRESHOLD,
};
