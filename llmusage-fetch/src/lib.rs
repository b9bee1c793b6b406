// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llm-usage Fetch
//!
//! HTTP plumbing and the concurrent fetch core.
//!
//! - [`http::HttpClient`] - shared client with fixed timeout and uniform
//!   status/decode error mapping
//! - [`provider::UsageProvider`] - the adapter contract every vendor implements
//! - [`fanout::fetch_all`] - scatter/gather over resolved instances
//!
//! ## Example
//!
//! ```ignore
//! use llmusage_fetch::{fetch_all, ProviderInstance};
//!
//! let instances: Vec<ProviderInstance> = resolver.resolve("all", "", false).await;
//! let stats = fetch_all(&instances).await;
//! println!("max utilization: {:.1}%", stats.max_utilization());
//! ```

pub mod error;
pub mod fanout;
pub mod http;
pub mod provider;

pub use error::FetchError;
pub use fanout::fetch_all;
pub use http::{HttpClient, endpoint};
pub use provider::{ProviderInstance, UsageProvider};
