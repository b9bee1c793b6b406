//! Provider resolution.
//!
//! Turns a provider filter and an account filter into concrete
//! [`ProviderInstance`]s by reading the credential store (and, for Claude,
//! the Claude CLI's own credential file). Only this module and the vendor
//! modules know vendor identity; everything downstream works on the
//! [`UsageProvider`](llmusage_fetch::UsageProvider) trait object.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use llmusage_core::ProviderKind;
use llmusage_fetch::ProviderInstance;
use llmusage_store::{
    ApiKeyAccount, ApiKeyCredentials, ClaudeCredentials, CredentialDocument, CredentialStore,
    DEFAULT_ACCOUNT, MiniMaxAccount, MiniMaxCredentials, OAuthAccount, default_claude_cli_path,
    load_claude_cli_credentials,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::claude::{ClaudeClient, ClaudeProvider};
use crate::context::ProviderContext;
use crate::kimi::{KimiClient, KimiProvider};
use crate::minimax::{MiniMaxClient, MiniMaxProvider};
use crate::zai::{ZaiClient, ZaiProvider};

/// Provider filter value meaning "everything configured".
pub const ALL_PROVIDERS: &str = "all";

/// A provider with its configured account names, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfiguredProvider {
    /// Provider id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Account names, sorted.
    pub accounts: Vec<String>,
}

// ============================================================================
// Resolver
// ============================================================================

/// Builds provider instances from stored credentials.
#[derive(Debug, Clone)]
pub struct ProviderResolver {
    store: CredentialStore,
    claude_cli_path: Option<PathBuf>,
    ctx: ProviderContext,
    base_urls: HashMap<ProviderKind, String>,
}

impl ProviderResolver {
    /// Creates a resolver over a store, using the default Claude CLI path.
    pub fn new(store: CredentialStore, ctx: ProviderContext) -> Self {
        Self {
            store,
            claude_cli_path: default_claude_cli_path(),
            ctx,
            base_urls: HashMap::new(),
        }
    }

    /// Overrides (or with `None`, disables) the Claude CLI credential source.
    pub fn with_claude_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.claude_cli_path = path;
        self
    }

    /// Points every client built for `kind` at a different base URL.
    pub fn with_base_url(mut self, kind: ProviderKind, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(kind, base_url.into());
        self
    }

    /// Returns the underlying credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Resolves filters into provider instances.
    ///
    /// `provider_filter` is empty, `"all"`, or a comma-separated id list
    /// (order kept, duplicates kept, unknown ids skipped). An empty
    /// `account_filter` or `all_accounts` selects every usable account.
    /// Output is grouped by provider in candidate order, accounts sorted.
    /// For Claude with no account filter, an unexpired Claude CLI credential
    /// comes first as `"default"` and shadows the store's `"default"`.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        provider_filter: &str,
        account_filter: &str,
        all_accounts: bool,
    ) -> Vec<ProviderInstance> {
        let account = if all_accounts { "" } else { account_filter.trim() };
        let mut instances = Vec::new();

        for id in self.candidate_ids(provider_filter).await {
            let Some(kind) = ProviderKind::from_id(&id) else {
                debug!(id, "Skipping unknown provider id");
                continue;
            };
            let resolved = match kind {
                ProviderKind::Claude => self.resolve_claude(account).await,
                ProviderKind::Kimi | ProviderKind::Zai => self.resolve_api_key(kind, account).await,
                ProviderKind::MiniMax => self.resolve_minimax(account).await,
            };
            debug!(provider = %kind, count = resolved.len(), "Resolved provider");
            instances.extend(resolved);
        }

        instances
    }

    async fn candidate_ids(&self, provider_filter: &str) -> Vec<String> {
        let filter = provider_filter.trim();
        if !filter.is_empty() && !filter.eq_ignore_ascii_case(ALL_PROVIDERS) {
            return filter
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        let available = self.store.list_available().await.unwrap_or_else(|e| {
            warn!(error = %e, "Cannot list credential store");
            Vec::new()
        });
        if available.is_empty() {
            vec![ProviderKind::Claude.id().to_string()]
        } else {
            available
        }
    }

    /// Loads a document; absence is silent, anything else is logged.
    async fn load_doc<D: CredentialDocument>(&self, kind: ProviderKind) -> Option<D> {
        match self.store.load::<D>(kind).await {
            Ok(doc) => Some(doc),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!(provider = %kind, error = %e, "Ignoring unusable credentials");
                None
            }
        }
    }

    /// Picks accounts from a document: all of them, or exactly the named one.
    fn select<D: CredentialDocument>(doc: &D, account: &str) -> Vec<(String, D::Account)> {
        if account.is_empty() {
            doc.list_accounts()
                .into_iter()
                .filter_map(|name| doc.get_account(&name).map(|a| (name, a)))
                .collect()
        } else {
            doc.get_account(account)
                .map(|a| vec![(account.to_string(), a)])
                .unwrap_or_default()
        }
    }

    fn base_url(&self, kind: ProviderKind) -> Option<&str> {
        self.base_urls.get(&kind).map(String::as_str)
    }

    // ------------------------------------------------------------------------
    // Claude
    // ------------------------------------------------------------------------

    async fn load_claude_cli(&self) -> Option<OAuthAccount> {
        let path = self.claude_cli_path.as_deref()?;
        match load_claude_cli_credentials(path).await {
            Ok(account) => Some(account),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                debug!(error = %e, "Ignoring Claude CLI credentials");
                None
            }
        }
    }

    /// Named lookups read the store only. Otherwise the CLI credential
    /// leads, followed by the store's accounts in sorted order.
    async fn resolve_claude(&self, account: &str) -> Vec<ProviderInstance> {
        let store_doc = self.load_doc::<ClaudeCredentials>(ProviderKind::Claude).await;

        if !account.is_empty() {
            return store_doc
                .map(|doc| Self::select(&doc, account))
                .unwrap_or_default()
                .into_iter()
                .filter(|(name, oauth)| {
                    let expired = oauth.is_expired();
                    if expired {
                        debug!(account = %name, "Skipping expired Claude token");
                    }
                    !expired
                })
                .map(|(name, oauth)| self.claude_instance(&oauth, name))
                .collect();
        }

        let mut picked: Vec<(String, OAuthAccount)> = Vec::new();
        if let Some(cli) = self.load_claude_cli().await.filter(|a| !a.is_expired()) {
            picked.push((DEFAULT_ACCOUNT.to_string(), cli));
        }
        let cli_contributed = !picked.is_empty();

        let stored = store_doc
            .map(|doc| Self::select(&doc, ""))
            .unwrap_or_default()
            .into_iter()
            .filter(|(name, oauth)| {
                !(cli_contributed && name == DEFAULT_ACCOUNT) && !oauth.is_expired()
            });
        picked.extend(stored);

        picked
            .into_iter()
            .map(|(name, oauth)| self.claude_instance(&oauth, name))
            .collect()
    }

    fn claude_instance(&self, oauth: &OAuthAccount, account: String) -> ProviderInstance {
        let mut client = ClaudeClient::new(self.ctx.http.clone(), oauth.access_token.clone());
        if let Some(base) = self.base_url(ProviderKind::Claude) {
            client = client.with_base_url(base);
        }
        ProviderInstance::new(Arc::new(ClaudeProvider::new(client)), account)
    }

    // ------------------------------------------------------------------------
    // Single-source vendors
    // ------------------------------------------------------------------------

    async fn resolve_api_key(&self, kind: ProviderKind, account: &str) -> Vec<ProviderInstance> {
        let Some(doc) = self.load_doc::<ApiKeyCredentials>(kind).await else {
            return Vec::new();
        };
        Self::select(&doc, account)
            .into_iter()
            .map(|(name, key)| self.api_key_instance(kind, &key, name))
            .collect()
    }

    fn api_key_instance(
        &self,
        kind: ProviderKind,
        key: &ApiKeyAccount,
        account: String,
    ) -> ProviderInstance {
        let http = self.ctx.http.clone();
        let base = self.base_url(kind);
        let provider: Arc<dyn llmusage_fetch::UsageProvider> = if kind == ProviderKind::Zai {
            let mut client = ZaiClient::new(http, key.api_key.clone());
            if let Some(base) = base {
                client = client.with_base_url(base);
            }
            Arc::new(ZaiProvider::new(client))
        } else {
            let mut client = KimiClient::new(http, key.api_key.clone());
            if let Some(base) = base {
                client = client.with_base_url(base);
            }
            Arc::new(KimiProvider::new(client, self.ctx.clone()))
        };
        ProviderInstance::new(provider, account)
    }

    async fn resolve_minimax(&self, account: &str) -> Vec<ProviderInstance> {
        let Some(doc) = self.load_doc::<MiniMaxCredentials>(ProviderKind::MiniMax).await else {
            return Vec::new();
        };
        Self::select(&doc, account)
            .into_iter()
            .map(|(name, session)| self.minimax_instance(&session, name))
            .collect()
    }

    fn minimax_instance(&self, session: &MiniMaxAccount, account: String) -> ProviderInstance {
        let mut client = MiniMaxClient::new(
            self.ctx.http.clone(),
            session.cookie.clone(),
            session.group_id.clone(),
        );
        if let Some(base) = self.base_url(ProviderKind::MiniMax) {
            client = client.with_base_url(base);
        }
        ProviderInstance::new(
            Arc::new(MiniMaxProvider::new(client, self.ctx.clone())),
            account,
        )
    }

    // ------------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------------

    /// Lists configured providers and their account names.
    ///
    /// Reads the credential store only; Claude additionally lists
    /// `"default"` when the Claude CLI credential file exists. Providers
    /// with no usable accounts are omitted.
    pub async fn list_configured(&self) -> Vec<ConfiguredProvider> {
        let mut listed = Vec::new();

        for &kind in ProviderKind::all() {
            let mut accounts = match self.store.account_names(kind).await {
                Ok(names) => names,
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => {
                    warn!(provider = %kind, error = %e, "Ignoring unusable credentials");
                    Vec::new()
                }
            };

            if kind == ProviderKind::Claude
                && !accounts.iter().any(|a| a == DEFAULT_ACCOUNT)
                && self.claude_cli_exists().await
            {
                accounts.push(DEFAULT_ACCOUNT.to_string());
                accounts.sort();
            }

            if !accounts.is_empty() {
                listed.push(ConfiguredProvider {
                    id: kind.id().to_string(),
                    name: kind.display_name().to_string(),
                    accounts,
                });
            }
        }

        listed
    }

    async fn claude_cli_exists(&self) -> bool {
        match &self.claude_cli_path {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_mock, test_context};
    use axum::{
        Json, Router,
        http::HeaderMap,
        routing::{get, post},
    };
    use chrono::Utc;
    use llmusage_fetch::fetch_all;
    use serde_json::json;
    use llmusage_store::save_json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct Fixture {
        resolver: ProviderResolver,
        config: TempDir,
        _cache: TempDir,
    }

    fn fixture() -> Fixture {
        let config = TempDir::new().unwrap();
        let (ctx, cache) = test_context();
        let resolver = ProviderResolver::new(CredentialStore::new(config.path()), ctx)
            .with_claude_cli_path(Some(config.path().join("cli").join(".credentials.json")));
        Fixture {
            resolver,
            config,
            _cache: cache,
        }
    }

    fn oauth(token: &str, expires_in_ms: i64) -> OAuthAccount {
        OAuthAccount {
            access_token: token.to_string(),
            refresh_token: String::new(),
            expires_at: Utc::now().timestamp_millis() + expires_in_ms,
            scopes: Vec::new(),
        }
    }

    async fn write_cli(f: &Fixture, account: OAuthAccount) {
        let doc = ClaudeCredentials {
            claude_ai_oauth: Some(account),
            accounts: BTreeMap::new(),
        };
        save_json(&f.config.path().join("cli").join(".credentials.json"), &doc)
            .await
            .unwrap();
    }

    async fn write_kimi(f: &Fixture, names: &[&str]) {
        let mut doc = ApiKeyCredentials::default();
        for name in names {
            doc.upsert_account(
                name,
                ApiKeyAccount {
                    api_key: format!("sk-{name}"),
                },
            );
        }
        f.resolver.store().save(ProviderKind::Kimi, &doc).await.unwrap();
    }

    fn rows(instances: &[ProviderInstance]) -> Vec<(String, String)> {
        instances
            .iter()
            .map(|i| (i.id().to_string(), i.account.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_named_providers_without_credentials() {
        let f = fixture();
        assert!(f.resolver.resolve("kimi,zai", "", false).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_skipped() {
        let f = fixture();
        write_kimi(&f, &["default"]).await;
        let instances = f.resolver.resolve("bogus, kimi", "", false).await;
        assert_eq!(rows(&instances), vec![("kimi".into(), "default".into())]);
    }

    #[tokio::test]
    async fn test_account_filter() {
        let f = fixture();
        write_kimi(&f, &["work", "personal"]).await;

        let all = f.resolver.resolve("kimi", "", false).await;
        assert_eq!(
            rows(&all),
            vec![
                ("kimi".into(), "personal".into()),
                ("kimi".into(), "work".into())
            ]
        );

        let one = f.resolver.resolve("kimi", "work", false).await;
        assert_eq!(rows(&one), vec![("kimi".into(), "work".into())]);

        assert!(f.resolver.resolve("kimi", "missing", false).await.is_empty());

        let forced = f.resolver.resolve("kimi", "work", true).await;
        assert_eq!(forced.len(), 2);
    }

    #[tokio::test]
    async fn test_default_and_work_accounts_end_to_end() {
        let f = fixture();
        write_kimi(&f, &["default", "work"]).await;

        let app = Router::new().route(
            "/apiv2/kimi.gateway.billing.v1.BillingService/GetUsages",
            post(|| async {
                Json(json!({"usages": [{
                    "scope": "FEATURE_CODING",
                    "detail": {"limit": "100", "used": "37"}
                }]}))
            }),
        );
        let base = spawn_mock(app).await;
        let resolver = f.resolver.clone().with_base_url(ProviderKind::Kimi, base);

        let both = resolver.resolve("kimi", "", false).await;
        assert_eq!(
            rows(&both),
            vec![
                ("kimi".into(), "default".into()),
                ("kimi".into(), "work".into())
            ]
        );
        let stats = fetch_all(&both).await;
        assert_eq!(stats.providers.len(), 2);
        assert_eq!(stats.providers[0].account(), None);
        assert!(!stats.providers[0].extra.contains_key("account"));
        assert_eq!(stats.providers[1].account(), Some("work"));

        let work = resolver.resolve("kimi", "work", false).await;
        assert_eq!(rows(&work), vec![("kimi".into(), "work".into())]);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let f = fixture();
        write_kimi(&f, &["default"]).await;
        assert_eq!(f.resolver.resolve("kimi,kimi", "", false).await.len(), 2);
    }

    #[tokio::test]
    async fn test_all_uses_available_documents() {
        let f = fixture();
        write_kimi(&f, &["a"]).await;
        let mut mm = MiniMaxCredentials::default();
        mm.upsert_account(
            "default",
            MiniMaxAccount {
                cookie: "c".into(),
                group_id: "g".into(),
            },
        );
        f.resolver.store().save(ProviderKind::MiniMax, &mm).await.unwrap();

        let instances = f.resolver.resolve("all", "", false).await;
        assert_eq!(
            rows(&instances),
            vec![
                ("kimi".into(), "a".into()),
                ("minimax".into(), "default".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_configured_falls_back_to_claude() {
        let f = fixture();
        assert!(f.resolver.resolve("", "", false).await.is_empty());

        write_cli(&f, oauth("cli", 60_000)).await;
        let instances = f.resolver.resolve("", "", false).await;
        assert_eq!(rows(&instances), vec![("claude".into(), "default".into())]);
    }

    #[tokio::test]
    async fn test_claude_cli_shadows_stored_default() {
        let f = fixture();
        write_cli(&f, oauth("cli", 60_000)).await;
        let mut doc = ClaudeCredentials::default();
        doc.upsert_account("default", oauth("stored", 60_000));
        doc.upsert_account("alpha", oauth("alpha", 60_000));
        doc.upsert_account("work", oauth("work", 60_000));
        f.resolver.store().save(ProviderKind::Claude, &doc).await.unwrap();

        let instances = f.resolver.resolve("claude", "", false).await;
        assert_eq!(
            rows(&instances),
            vec![
                ("claude".into(), "default".into()),
                ("claude".into(), "alpha".into()),
                ("claude".into(), "work".into())
            ]
        );

        // The default row must carry the CLI token, not the stored one.
        let app = Router::new().route(
            "/api/oauth/usage",
            get(|headers: HeaderMap| async move {
                let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
                let util = if auth == Some("Bearer cli") { 11.0 } else { 22.0 };
                Json(json!({"five_hour": {"utilization": util}}))
            }),
        );
        let base = spawn_mock(app).await;
        let resolver = f.resolver.clone().with_base_url(ProviderKind::Claude, base);
        let instances = resolver.resolve("claude", "", false).await;
        let stats = fetch_all(&instances[..1]).await;
        let usage = &stats.providers[0];
        assert_eq!(usage.account(), None);
        assert!((usage.windows[0].utilization - 11.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_claude_stored_default_used_without_cli() {
        let f = fixture();
        write_cli(&f, oauth("cli", -60_000)).await;
        let mut doc = ClaudeCredentials::default();
        doc.upsert_account("default", oauth("stored", 60_000));
        doc.upsert_account("alpha", oauth("alpha", 60_000));
        f.resolver.store().save(ProviderKind::Claude, &doc).await.unwrap();

        let instances = f.resolver.resolve("claude", "", false).await;
        assert_eq!(
            rows(&instances),
            vec![
                ("claude".into(), "alpha".into()),
                ("claude".into(), "default".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_claude_cli_added_as_default() {
        let f = fixture();
        write_cli(&f, oauth("cli", 60_000)).await;
        let mut doc = ClaudeCredentials::default();
        doc.upsert_account("work", oauth("work", 60_000));
        f.resolver.store().save(ProviderKind::Claude, &doc).await.unwrap();

        let instances = f.resolver.resolve("claude", "", false).await;
        assert_eq!(
            rows(&instances),
            vec![
                ("claude".into(), "default".into()),
                ("claude".into(), "work".into())
            ]
        );

        let named = f.resolver.resolve("claude", "default", false).await;
        assert!(named.is_empty(), "named lookups read the store only");
    }

    #[tokio::test]
    async fn test_claude_expired_tokens_are_skipped() {
        let f = fixture();
        write_cli(&f, oauth("cli", -60_000)).await;
        let mut doc = ClaudeCredentials::default();
        doc.upsert_account("old", oauth("old", -60_000));
        doc.upsert_account("work", oauth("work", 60_000));
        f.resolver.store().save(ProviderKind::Claude, &doc).await.unwrap();

        let instances = f.resolver.resolve("claude", "", false).await;
        assert_eq!(rows(&instances), vec![("claude".into(), "work".into())]);
        assert!(f.resolver.resolve("claude", "old", false).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_is_skipped() {
        let f = fixture();
        tokio::fs::write(f.config.path().join("kimi.json"), "{not json")
            .await
            .unwrap();
        assert!(f.resolver.resolve("kimi", "", false).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_configured() {
        let f = fixture();
        write_kimi(&f, &["work", "personal"]).await;
        write_cli(&f, oauth("cli", -1)).await;

        let listed = f.resolver.list_configured().await;
        assert_eq!(
            listed,
            vec![
                ConfiguredProvider {
                    id: "claude".into(),
                    name: "Claude".into(),
                    accounts: vec!["default".into()],
                },
                ConfiguredProvider {
                    id: "kimi".into(),
                    name: "Kimi".into(),
                    accounts: vec!["personal".into(), "work".into()],
                },
            ]
        );
    }
}
