// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # llm-usage Store
//!
//! Everything llm-usage keeps on disk.
//!
//! - **CredentialStore**: per-provider credential documents (legacy and
//!   multi-account layouts)
//! - **CacheManager**: TTL cache for secondary provider lookups
//! - **Settings**: user preferences
//! - **Persistence**: atomic, permission-restricted JSON file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use llmusage_store::{CredentialStore, ApiKeyCredentials, CredentialDocument};
//! use llmusage_core::ProviderKind;
//!
//! let store = CredentialStore::open_default();
//! let kimi: ApiKeyCredentials = store.load(ProviderKind::Kimi).await?;
//! for name in kimi.list_accounts() {
//!     println!("{name}");
//! }
//! ```

pub mod cache;
pub mod credentials;
pub mod error;
pub mod persistence;
pub mod settings;

pub use cache::{CacheManager, hash_key};
pub use credentials::{
    AccountCredential, ApiKeyAccount, ApiKeyCredentials, ClaudeCredentials, CredentialDocument,
    CredentialStore, DEFAULT_ACCOUNT, MiniMaxAccount, MiniMaxCredentials, OAuthAccount,
    default_claude_cli_path, load_claude_cli_credentials,
};
pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_settings_path, load_json, load_json_or_default,
    save_json,
};
pub use settings::{LogLevel, ServerSettings, Settings};
