//! Kimi (Moonshot) provider.
//!
//! API-key based. Two calls per fetch:
//! - `GetUsages` for the coding quota and its rate-limit windows
//! - `GetSubscription` for plan details, cached (see [`crate::context`])

mod api;
pub(crate) mod labels;
mod provider;

pub use api::{
    API_BASE_URL, KimiClient, KimiLimitItem, KimiSubscriptionResponse, KimiUsageDetail,
    KimiUsageItem, KimiUsageResponse,
};
pub use provider::KimiProvider;
