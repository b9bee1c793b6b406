//! Credential document shapes.
//!
//! Every provider document supports two layouts that may coexist on disk:
//!
//! - **legacy**: one flat credential, addressed as the `"default"` account
//! - **multi-account**: an `accounts` map of name to credential
//!
//! A non-empty `accounts` map always wins over the flat fields. Accounts are
//! kept in a [`BTreeMap`] so listing and "first account" lookups are sorted
//! by name.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::StoreError;

/// Name under which a legacy flat credential is exposed.
pub const DEFAULT_ACCOUNT: &str = "default";

// ============================================================================
// Traits
// ============================================================================

/// A single account's credential.
pub trait AccountCredential: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Returns the first required field that is empty, if any.
    fn missing_field(&self) -> Option<&'static str>;
}

/// A per-provider credential document.
pub trait CredentialDocument: Default + Serialize + DeserializeOwned + Send + Sync {
    /// Credential type stored per account.
    type Account: AccountCredential;

    /// Returns the legacy flat credential, if one is present.
    fn legacy(&self) -> Option<Self::Account>;

    /// Replaces (or clears) the legacy flat credential.
    fn set_legacy(&mut self, account: Option<Self::Account>);

    /// Named accounts.
    fn accounts(&self) -> &BTreeMap<String, Self::Account>;

    /// Named accounts, mutably.
    fn accounts_mut(&mut self) -> &mut BTreeMap<String, Self::Account>;

    /// Resolves an account by name.
    ///
    /// An empty name picks `"default"`, then the first account in sorted
    /// order, then the legacy credential. A non-empty name must match
    /// exactly; `"default"` also reaches the legacy credential when no
    /// accounts map is in force.
    fn get_account(&self, name: &str) -> Option<Self::Account> {
        let accounts = self.accounts();
        if name.is_empty() {
            return accounts
                .get(DEFAULT_ACCOUNT)
                .or_else(|| accounts.values().next())
                .cloned()
                .or_else(|| self.legacy());
        }
        if let Some(account) = accounts.get(name) {
            return Some(account.clone());
        }
        if accounts.is_empty() && name == DEFAULT_ACCOUNT {
            return self.legacy();
        }
        None
    }

    /// Lists account names: the map's keys, or `["default"]` for a
    /// legacy-only document, or nothing.
    fn list_accounts(&self) -> Vec<String> {
        let accounts = self.accounts();
        if !accounts.is_empty() {
            return accounts.keys().cloned().collect();
        }
        if self.legacy().is_some() {
            return vec![DEFAULT_ACCOUNT.to_string()];
        }
        Vec::new()
    }

    /// Returns true if the document holds no credential at all.
    fn is_empty(&self) -> bool {
        self.accounts().is_empty() && self.legacy().is_none()
    }

    /// Checks that every credential in force has its required fields.
    ///
    /// # Errors
    ///
    /// `StoreError::Validation` naming the offending account and field.
    fn validate(&self) -> Result<(), StoreError> {
        let accounts = self.accounts();
        if !accounts.is_empty() {
            for (name, account) in accounts {
                if let Some(field) = account.missing_field() {
                    return Err(StoreError::Validation(format!(
                        "account '{name}' is missing {field}"
                    )));
                }
            }
            return Ok(());
        }

        match self.legacy() {
            Some(account) => match account.missing_field() {
                Some(field) => Err(StoreError::Validation(format!("missing {field}"))),
                None => Ok(()),
            },
            None => Err(StoreError::Validation("no credentials configured".to_string())),
        }
    }

    /// Moves a legacy credential into `accounts["default"]` if the map is empty.
    fn fold_legacy(&mut self) {
        if self.accounts().is_empty() {
            if let Some(legacy) = self.legacy() {
                self.accounts_mut().insert(DEFAULT_ACCOUNT.to_string(), legacy);
            }
        }
        self.set_legacy(None);
    }

    /// Adds or replaces a named account.
    fn upsert_account(&mut self, name: &str, account: Self::Account) {
        self.fold_legacy();
        self.accounts_mut().insert(name.to_string(), account);
    }

    /// Removes a named account.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no such account exists.
    fn remove_account(&mut self, name: &str) -> Result<(), StoreError> {
        self.fold_legacy();
        if self.accounts_mut().remove(name).is_none() {
            return Err(StoreError::NotFound(format!("account '{name}'")));
        }
        Ok(())
    }

    /// Renames an account.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if `old` is missing, `StoreError::AlreadyExists`
    /// if `new` is taken.
    fn rename_account(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        self.fold_legacy();
        if self.accounts().contains_key(new) {
            return Err(StoreError::AlreadyExists(format!("account '{new}'")));
        }
        let account = self
            .accounts_mut()
            .remove(old)
            .ok_or_else(|| StoreError::NotFound(format!("account '{old}'")))?;
        self.accounts_mut().insert(new.to_string(), account);
        Ok(())
    }
}

fn non_empty(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

// ============================================================================
// Claude (OAuth)
// ============================================================================

/// OAuth token pair as written by the Claude CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthAccount {
    /// Bearer token.
    #[serde(default)]
    pub access_token: String,
    /// Refresh token (stored, not used for refreshing).
    #[serde(default)]
    pub refresh_token: String,
    /// Expiry in epoch milliseconds.
    #[serde(default)]
    pub expires_at: i64,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuthAccount {
    /// Returns true once the current time is past `expires_at`.
    ///
    /// A zero or missing expiry counts as expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at
    }
}

impl AccountCredential for OAuthAccount {
    fn missing_field(&self) -> Option<&'static str> {
        self.access_token.is_empty().then_some("accessToken")
    }
}

/// Claude credential document (`claude.json`, also the Claude CLI file shape).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeCredentials {
    /// Legacy flat credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_ai_oauth: Option<OAuthAccount>,
    /// Named accounts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub accounts: BTreeMap<String, OAuthAccount>,
}

impl CredentialDocument for ClaudeCredentials {
    type Account = OAuthAccount;

    fn legacy(&self) -> Option<OAuthAccount> {
        self.claude_ai_oauth.clone()
    }

    fn set_legacy(&mut self, account: Option<OAuthAccount>) {
        self.claude_ai_oauth = account;
    }

    fn accounts(&self) -> &BTreeMap<String, OAuthAccount> {
        &self.accounts
    }

    fn accounts_mut(&mut self) -> &mut BTreeMap<String, OAuthAccount> {
        &mut self.accounts
    }
}

// ============================================================================
// Kimi / Z.AI (API key)
// ============================================================================

/// A single API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyAccount {
    /// Bearer API key.
    #[serde(default)]
    pub api_key: String,
}

impl AccountCredential for ApiKeyAccount {
    fn missing_field(&self) -> Option<&'static str> {
        self.api_key.is_empty().then_some("apiKey")
    }
}

/// API-key credential document shared by Kimi and Z.AI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCredentials {
    /// Legacy flat key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Named accounts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub accounts: BTreeMap<String, ApiKeyAccount>,
}

impl CredentialDocument for ApiKeyCredentials {
    type Account = ApiKeyAccount;

    fn legacy(&self) -> Option<ApiKeyAccount> {
        non_empty(self.api_key.as_ref()).then(|| ApiKeyAccount {
            api_key: self.api_key.clone().unwrap_or_default(),
        })
    }

    fn set_legacy(&mut self, account: Option<ApiKeyAccount>) {
        self.api_key = account.map(|a| a.api_key);
    }

    fn accounts(&self) -> &BTreeMap<String, ApiKeyAccount> {
        &self.accounts
    }

    fn accounts_mut(&mut self) -> &mut BTreeMap<String, ApiKeyAccount> {
        &mut self.accounts
    }
}

// ============================================================================
// MiniMax (cookie + group id)
// ============================================================================

/// A MiniMax platform session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniMaxAccount {
    /// Raw `Cookie` header value.
    #[serde(default)]
    pub cookie: String,
    /// Organization group id.
    #[serde(default)]
    pub group_id: String,
}

impl AccountCredential for MiniMaxAccount {
    fn missing_field(&self) -> Option<&'static str> {
        if self.cookie.is_empty() {
            Some("cookie")
        } else if self.group_id.is_empty() {
            Some("groupId")
        } else {
            None
        }
    }
}

/// MiniMax credential document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniMaxCredentials {
    /// Legacy flat cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    /// Legacy flat group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Named accounts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub accounts: BTreeMap<String, MiniMaxAccount>,
}

impl CredentialDocument for MiniMaxCredentials {
    type Account = MiniMaxAccount;

    fn legacy(&self) -> Option<MiniMaxAccount> {
        (non_empty(self.cookie.as_ref()) || non_empty(self.group_id.as_ref())).then(|| {
            MiniMaxAccount {
                cookie: self.cookie.clone().unwrap_or_default(),
                group_id: self.group_id.clone().unwrap_or_default(),
            }
        })
    }

    fn set_legacy(&mut self, account: Option<MiniMaxAccount>) {
        match account {
            Some(a) => {
                self.cookie = Some(a.cookie);
                self.group_id = Some(a.group_id);
            }
            None => {
                self.cookie = None;
                self.group_id = None;
            }
        }
    }

    fn accounts(&self) -> &BTreeMap<String, MiniMaxAccount> {
        &self.accounts
    }

    fn accounts_mut(&mut self) -> &mut BTreeMap<String, MiniMaxAccount> {
        &mut self.accounts
    }
}
