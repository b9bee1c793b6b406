//! Accounts command - manage stored provider credentials.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use llmusage_core::ProviderKind;
use llmusage_store::{
    ApiKeyAccount, ApiKeyCredentials, ClaudeCredentials, CredentialDocument, CredentialStore,
    MiniMaxAccount, MiniMaxCredentials, OAuthAccount, default_claude_cli_path,
};
use serde::Serialize;
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the accounts command.
#[derive(Args)]
pub struct AccountsArgs {
    #[command(subcommand)]
    pub action: AccountsAction,
}

/// Accounts subcommands.
#[derive(Subcommand)]
pub enum AccountsAction {
    /// List configured accounts.
    List {
        /// Only this provider.
        provider: Option<String>,
    },

    /// Add or replace an account.
    Add {
        /// Provider id (claude, kimi, zai, minimax).
        provider: String,
        /// Account name.
        name: String,
        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Remove an account.
    Remove {
        /// Provider id.
        provider: String,
        /// Account name.
        name: String,
    },

    /// Rename an account.
    Rename {
        /// Provider id.
        provider: String,
        /// Current name.
        old: String,
        /// New name.
        new: String,
    },
}

/// Credential material for `accounts add`.
#[derive(Args, Debug, Default, Clone)]
pub struct SecretArgs {
    /// API key (kimi, zai).
    #[arg(long)]
    pub api_key: Option<String>,

    /// OAuth access token (claude).
    #[arg(long)]
    pub access_token: Option<String>,

    /// OAuth refresh token (claude).
    #[arg(long, requires = "access_token")]
    pub refresh_token: Option<String>,

    /// Token expiry in epoch milliseconds (claude).
    #[arg(long, requires = "access_token")]
    pub expires_at: Option<i64>,

    /// Session cookie header value (minimax).
    #[arg(long, requires = "group_id")]
    pub cookie: Option<String>,

    /// Organization group id (minimax).
    #[arg(long, requires = "cookie")]
    pub group_id: Option<String>,
}

/// Accounts configured for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountListing {
    /// Provider id.
    pub provider: String,
    /// Sorted account names.
    pub accounts: Vec<String>,
}

// ============================================================================
// Entry Points
// ============================================================================

/// Runs the accounts command against the default store.
pub async fn run(args: &AccountsArgs, cli: &Cli) -> Result<ExitCode> {
    let store = CredentialStore::open_default();

    match &args.action {
        AccountsAction::List { provider } => {
            let listings = list(&store, provider.as_deref()).await?;
            print_listings(cli, &listings)?;
        }
        AccountsAction::Add {
            provider,
            name,
            secret,
        } => {
            let kind = parse_kind(provider)?;
            add(&store, kind, name, secret).await?;
            println!("Saved {} account '{name}'", kind.display_name());
        }
        AccountsAction::Remove { provider, name } => {
            let kind = parse_kind(provider)?;
            remove(&store, kind, name).await?;
            println!("Removed {} account '{name}'", kind.display_name());
        }
        AccountsAction::Rename { provider, old, new } => {
            let kind = parse_kind(provider)?;
            rename(&store, kind, old, new).await?;
            println!("Renamed {} account '{old}' to '{new}'", kind.display_name());
        }
    }

    Ok(ExitCode::Success)
}

/// Copies the Claude CLI credential file into the store.
pub async fn migrate_claude(_cli: &Cli) -> Result<ExitCode> {
    let source = default_claude_cli_path().context("Cannot locate the home directory")?;
    let store = CredentialStore::open_default();
    let dest = store
        .migrate_legacy_source(&source, ProviderKind::Claude)
        .await
        .with_context(|| format!("Failed to migrate {}", source.display()))?;
    println!("Migrated {} to {}", source.display(), dest.display());
    Ok(ExitCode::Success)
}

fn parse_kind(id: &str) -> Result<ProviderKind> {
    match ProviderKind::from_id(id) {
        Some(kind) => Ok(kind),
        None => bail!("Unknown provider: {id}. Use: claude, kimi, zai, minimax"),
    }
}

fn print_listings(cli: &Cli, listings: &[AccountListing]) -> Result<()> {
    match cli.output_format() {
        OutputFormat::Text => {
            if listings.is_empty() {
                println!("No accounts configured");
            }
            for listing in listings {
                println!("{}:", listing.provider);
                for account in &listing.accounts {
                    println!("  • {account}");
                }
            }
        }
        OutputFormat::Json | OutputFormat::Waybar => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&listings)?);
        }
    }
    Ok(())
}

// ============================================================================
// Store Operations
// ============================================================================

/// Lists stored accounts, for one provider or all of them.
pub async fn list(store: &CredentialStore, provider: Option<&str>) -> Result<Vec<AccountListing>> {
    let kinds = match provider {
        Some(id) => vec![parse_kind(id)?],
        None => ProviderKind::all().to_vec(),
    };

    let mut listings = Vec::new();
    for kind in kinds {
        let accounts = match store.account_names(kind).await {
            Ok(names) => names,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        };
        if !accounts.is_empty() {
            listings.push(AccountListing {
                provider: kind.id().to_string(),
                accounts,
            });
        }
    }
    Ok(listings)
}

/// Adds or replaces an account, creating the document if needed.
pub async fn add(
    store: &CredentialStore,
    kind: ProviderKind,
    name: &str,
    secret: &SecretArgs,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Account name must not be empty");
    }

    match kind {
        ProviderKind::Claude => {
            let (Some(access_token), Some(expires_at)) = (&secret.access_token, secret.expires_at)
            else {
                bail!("Claude accounts need --access-token and --expires-at");
            };
            let account = OAuthAccount {
                access_token: access_token.clone(),
                refresh_token: secret.refresh_token.clone().unwrap_or_default(),
                expires_at,
                scopes: Vec::new(),
            };
            upsert::<ClaudeCredentials>(store, kind, name, account).await
        }
        ProviderKind::Kimi | ProviderKind::Zai => {
            let Some(api_key) = &secret.api_key else {
                bail!("{} accounts need --api-key", kind.display_name());
            };
            let account = ApiKeyAccount {
                api_key: api_key.clone(),
            };
            upsert::<ApiKeyCredentials>(store, kind, name, account).await
        }
        ProviderKind::MiniMax => {
            let (Some(cookie), Some(group_id)) = (&secret.cookie, &secret.group_id) else {
                bail!("MiniMax accounts need --cookie and --group-id");
            };
            let account = MiniMaxAccount {
                cookie: cookie.clone(),
                group_id: group_id.clone(),
            };
            upsert::<MiniMaxCredentials>(store, kind, name, account).await
        }
    }
}

/// Removes an account; the document goes when its last account does.
pub async fn remove(store: &CredentialStore, kind: ProviderKind, name: &str) -> Result<()> {
    match kind {
        ProviderKind::Claude => remove_from::<ClaudeCredentials>(store, kind, name).await,
        ProviderKind::Kimi | ProviderKind::Zai => {
            remove_from::<ApiKeyCredentials>(store, kind, name).await
        }
        ProviderKind::MiniMax => remove_from::<MiniMaxCredentials>(store, kind, name).await,
    }
}

/// Renames an account.
pub async fn rename(store: &CredentialStore, kind: ProviderKind, old: &str, new: &str) -> Result<()> {
    if new.trim().is_empty() {
        bail!("Account name must not be empty");
    }
    match kind {
        ProviderKind::Claude => rename_in::<ClaudeCredentials>(store, kind, old, new).await,
        ProviderKind::Kimi | ProviderKind::Zai => {
            rename_in::<ApiKeyCredentials>(store, kind, old, new).await
        }
        ProviderKind::MiniMax => rename_in::<MiniMaxCredentials>(store, kind, old, new).await,
    }
}

async fn load_or_default<D: CredentialDocument>(
    store: &CredentialStore,
    kind: ProviderKind,
) -> Result<D> {
    match store.load::<D>(kind).await {
        Ok(doc) => Ok(doc),
        Err(e) if e.is_not_found() => Ok(D::default()),
        Err(e) => Err(e.into()),
    }
}

async fn upsert<D: CredentialDocument>(
    store: &CredentialStore,
    kind: ProviderKind,
    name: &str,
    account: D::Account,
) -> Result<()> {
    let mut doc: D = load_or_default(store, kind).await?;
    doc.upsert_account(name, account);
    store.save(kind, &doc).await?;
    info!(provider = %kind, account = name, "Account saved");
    Ok(())
}

async fn remove_from<D: CredentialDocument>(
    store: &CredentialStore,
    kind: ProviderKind,
    name: &str,
) -> Result<()> {
    let mut doc: D = store
        .load(kind)
        .await
        .with_context(|| format!("No {} credentials stored", kind.display_name()))?;
    doc.remove_account(name)?;

    if doc.is_empty() {
        store.delete(kind).await?;
    } else {
        store.save(kind, &doc).await?;
    }
    info!(provider = %kind, account = name, "Account removed");
    Ok(())
}

async fn rename_in<D: CredentialDocument>(
    store: &CredentialStore,
    kind: ProviderKind,
    old: &str,
    new: &str,
) -> Result<()> {
    let mut doc: D = store
        .load(kind)
        .await
        .with_context(|| format!("No {} credentials stored", kind.display_name()))?;
    doc.rename_account(old, new)?;
    store.save(kind, &doc).await?;
    info!(provider = %kind, from = old, to = new, "Account renamed");
    Ok(())
}
