// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llm-usage Core
//!
//! Normalized data model shared by every llm-usage crate.
//!
//! Each vendor reports quota in its own shape; adapters map those shapes
//! into the types here so the fetch core and the output layers never need
//! to know which vendor they are looking at.
//!
//! ## Key Types
//!
//! - [`ProviderKind`] - Closed set of supported providers
//! - [`Usage`] - Result for one provider account (windows, extras or error)
//! - [`UsageWindow`] - One quota/rate-limit bucket
//! - [`UsageStats`] - Aggregate in resolution order
//! - [`Severity`] - normal / warning / critical classification

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    ACCOUNT_KEY, CRITICAL_THRESHOLD, ProviderKind, Severity, Usage, UsageStats, UsageWindow,
    WARNING_THRESHOLD, display_name_for, short_name_for,
};
