//! MiniMax provider.
//!
//! Authenticates with a browser session cookie plus the account's group id.
//! The vendor reports failures in-band through `base_resp`, so a 200 can
//! still be an error.

mod api;
mod provider;

pub use api::{API_BASE_URL, BaseResp, CodingPlanResponse, MiniMaxClient, ModelRemain, SubscriptionResponse};
pub use provider::MiniMaxProvider;
