//! Per-provider credential documents on disk.
//!
//! Each provider has one JSON document at `<config_dir>/<id>.json`. The
//! store only knows about files; the shape of each document lives in
//! [`document`].

pub mod document;

use std::path::{Path, PathBuf};

use llmusage_core::ProviderKind;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::persistence::{default_config_dir, load_json, remove_file, save_bytes, save_json};

pub use document::{
    AccountCredential, ApiKeyAccount, ApiKeyCredentials, ClaudeCredentials, CredentialDocument,
    DEFAULT_ACCOUNT, MiniMaxAccount, MiniMaxCredentials, OAuthAccount,
};

/// File stems in the config directory that are not credential documents.
const RESERVED_STEMS: &[&str] = &["settings"];

// ============================================================================
// Claude CLI credentials
// ============================================================================

/// Returns the path of the credential file maintained by the Claude CLI.
pub fn default_claude_cli_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".claude").join(".credentials.json"))
}

/// Loads the OAuth credential written by the Claude CLI.
///
/// # Errors
///
/// `StoreError::NotFound` if the file is absent, `StoreError::Validation`
/// if it holds no access token.
pub async fn load_claude_cli_credentials(path: &Path) -> Result<OAuthAccount, StoreError> {
    let doc: ClaudeCredentials = load_json(path).await?;
    match doc.claude_ai_oauth {
        Some(oauth) if !oauth.access_token.is_empty() => Ok(oauth),
        _ => Err(StoreError::Validation(format!(
            "{}: no OAuth access token",
            path.display()
        ))),
    }
}

// ============================================================================
// Credential Store
// ============================================================================

/// File-backed store of provider credential documents.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Creates a store rooted at `dir`. Nothing is touched until first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store rooted at the default config directory.
    pub fn open_default() -> Self {
        Self::new(default_config_dir())
    }

    /// Returns the config directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the document path for a provider.
    pub fn path_for(&self, kind: ProviderKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.id()))
    }

    /// Loads and validates a provider's document.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Parse` if malformed, `Validation` if incomplete.
    #[instrument(skip(self), fields(provider = %kind))]
    pub async fn load<D: CredentialDocument>(&self, kind: ProviderKind) -> Result<D, StoreError> {
        let doc: D = load_json(&self.path_for(kind)).await?;
        doc.validate()?;
        debug!(accounts = doc.list_accounts().len(), "Loaded credentials");
        Ok(doc)
    }

    /// Validates and atomically writes a provider's document.
    ///
    /// # Errors
    ///
    /// `Validation` if the document is incomplete, IO errors otherwise.
    #[instrument(skip(self, doc), fields(provider = %kind))]
    pub async fn save<D: CredentialDocument>(
        &self,
        kind: ProviderKind,
        doc: &D,
    ) -> Result<(), StoreError> {
        doc.validate()?;
        save_json(&self.path_for(kind), doc).await?;
        info!("Saved credentials");
        Ok(())
    }

    /// Deletes a provider's document.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is nothing to delete.
    pub async fn delete(&self, kind: ProviderKind) -> Result<(), StoreError> {
        remove_file(&self.path_for(kind)).await?;
        info!(provider = %kind, "Deleted credentials");
        Ok(())
    }

    /// Returns true if a document file exists for the provider.
    pub async fn exists(&self, kind: ProviderKind) -> bool {
        tokio::fs::try_exists(self.path_for(kind))
            .await
            .unwrap_or(false)
    }

    /// Lists the ids of all documents present, sorted, regardless of validity.
    ///
    /// A missing config directory yields an empty list.
    ///
    /// # Errors
    ///
    /// IO errors other than "directory not found".
    pub async fn list_available(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !RESERVED_STEMS.contains(&stem) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Lists the configured account names for a provider.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub async fn account_names(&self, kind: ProviderKind) -> Result<Vec<String>, StoreError> {
        Ok(match kind {
            ProviderKind::Claude => self.load::<ClaudeCredentials>(kind).await?.list_accounts(),
            ProviderKind::Kimi | ProviderKind::Zai => {
                self.load::<ApiKeyCredentials>(kind).await?.list_accounts()
            }
            ProviderKind::MiniMax => self.load::<MiniMaxCredentials>(kind).await?.list_accounts(),
        })
    }

    /// Copies an external tool's credential file into the store.
    ///
    /// The source must be a JSON document; it is copied as-is. An existing
    /// destination is never overwritten.
    ///
    /// # Errors
    ///
    /// `NotFound` if the source is missing, `AlreadyExists` if the
    /// destination exists, `Parse` if the source is not JSON.
    #[instrument(skip(self), fields(provider = %kind))]
    pub async fn migrate_legacy_source(
        &self,
        source: &Path,
        kind: ProviderKind,
    ) -> Result<PathBuf, StoreError> {
        let dest = self.path_for(kind);
        if self.exists(kind).await {
            return Err(StoreError::AlreadyExists(dest.display().to_string()));
        }

        let bytes = match tokio::fs::read(source).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(source.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .map_err(|e| StoreError::Parse(format!("{}: {e}", source.display())))?;

        save_bytes(&dest, &bytes).await?;
        info!(from = %source.display(), to = %dest.display(), "Migrated credentials");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kimi_doc(names: &[&str]) -> ApiKeyCredentials {
        let mut doc = ApiKeyCredentials::default();
        for name in names {
            doc.upsert_account(
                name,
                ApiKeyAccount {
                    api_key: format!("sk-{name}"),
                },
            );
        }
        doc
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        let doc = kimi_doc(&["personal", "work"]);

        store.save(ProviderKind::Kimi, &doc).await.unwrap();
        let loaded: ApiKeyCredentials = store.load(ProviderKind::Kimi).await.unwrap();

        assert_eq!(loaded, doc);
        assert!(store.exists(ProviderKind::Kimi).await);
        assert!(dir.path().join("kimi.json").exists());
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("nope"));
        let err = store.load::<ApiKeyCredentials>(ProviderKind::Zai).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_load_malformed_is_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("zai.json"), "{not json").unwrap();
        let store = CredentialStore::new(dir.path());
        let err = store.load::<ApiKeyCredentials>(ProviderKind::Zai).await.unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[tokio::test]
    async fn test_load_incomplete_is_validation_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("minimax.json"), r#"{"cookie":"c"}"#).unwrap();
        let store = CredentialStore::new(dir.path());
        let err = store
            .load::<MiniMaxCredentials>(ProviderKind::MiniMax)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_save_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        let result = store.save(ProviderKind::Kimi, &ApiKeyCredentials::default()).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(!store.exists(ProviderKind::Kimi).await);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        assert!(store.delete(ProviderKind::Kimi).await.unwrap_err().is_not_found());

        store.save(ProviderKind::Kimi, &kimi_doc(&["a"])).await.unwrap();
        store.delete(ProviderKind::Kimi).await.unwrap();
        assert!(!store.exists(ProviderKind::Kimi).await);
    }

    #[tokio::test]
    async fn test_list_available() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        assert!(store.list_available().await.unwrap().is_empty());

        std::fs::write(dir.path().join("zai.json"), "{}").unwrap();
        std::fs::write(dir.path().join("kimi.json"), "garbage").unwrap();
        std::fs::write(dir.path().join("settings.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        assert_eq!(store.list_available().await.unwrap(), vec!["kimi", "zai"]);
    }

    #[tokio::test]
    async fn test_list_available_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("missing"));
        assert!(store.list_available().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_account_names() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save(ProviderKind::Kimi, &kimi_doc(&["work", "home"])).await.unwrap();
        assert_eq!(
            store.account_names(ProviderKind::Kimi).await.unwrap(),
            vec!["home", "work"]
        );
    }

    #[tokio::test]
    async fn test_migrate_legacy_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("cli.json");
        let store = CredentialStore::new(dir.path().join("config"));

        let missing = store.migrate_legacy_source(&source, ProviderKind::Claude).await;
        assert!(missing.unwrap_err().is_not_found());

        std::fs::write(
            &source,
            r#"{"claudeAiOauth":{"accessToken":"tok","expiresAt":1}}"#,
        )
        .unwrap();
        store
            .migrate_legacy_source(&source, ProviderKind::Claude)
            .await
            .unwrap();
        let doc: ClaudeCredentials = store.load(ProviderKind::Claude).await.unwrap();
        assert_eq!(doc.legacy().unwrap().access_token, "tok");

        let again = store.migrate_legacy_source(&source, ProviderKind::Claude).await;
        assert!(matches!(again, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_load_claude_cli_credentials() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".credentials.json");

        assert!(load_claude_cli_credentials(&path).await.unwrap_err().is_not_found());

        std::fs::write(&path, r#"{"claudeAiOauth":{"accessToken":""}}"#).unwrap();
        assert!(matches!(
            load_claude_cli_credentials(&path).await,
            Err(StoreError::Validation(_))
        ));

        std::fs::write(&path, r#"{"claudeAiOauth":{"accessToken":"tok"}}"#).unwrap();
        assert_eq!(load_claude_cli_credentials(&path).await.unwrap().access_token, "tok");
    }
}
