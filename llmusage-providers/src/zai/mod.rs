//! Z.AI provider.
//!
//! The quota endpoint is not publicly documented; the response is decoded
//! leniently and anything unrecognized yields no windows rather than an
//! error.

mod api;
mod provider;

pub use api::{API_BASE_URL, ZaiClient, ZaiLimit, ZaiQuotaResponse};
pub use provider::ZaiProvider;
