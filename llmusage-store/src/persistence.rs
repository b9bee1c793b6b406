//! File persistence helpers.
//!
//! Credentials and cache entries are secrets, so every write goes through
//! [`save_json`]: temp file + rename, 0600 files inside 0700 directories.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "LLM_USAGE_CONFIG_DIR";

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "LLM_USAGE_CACHE_DIR";

const APP_DIR_NAME: &str = "llm-usage";

// ============================================================================
// Default Paths
// ============================================================================

fn dir_from_env(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Returns the default configuration directory.
///
/// `$LLM_USAGE_CONFIG_DIR` if set, else `$XDG_CONFIG_HOME/llm-usage`
/// (the platform config dir elsewhere).
pub fn default_config_dir() -> PathBuf {
    dir_from_env(CONFIG_DIR_ENV).unwrap_or_else(|| {
        dirs::config_dir()
            .map(|c| c.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the default cache directory.
///
/// `$LLM_USAGE_CACHE_DIR` if set, else `$XDG_CACHE_HOME/llm-usage`.
pub fn default_cache_dir() -> PathBuf {
    dir_from_env(CACHE_DIR_ENV).unwrap_or_else(|| {
        dirs::cache_dir()
            .map(|c| c.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0600", "Set restrictive permissions");
    Ok(())
}

/// Sets restrictive directory permissions (0o700) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o700);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0700", "Set restrictive directory permissions");
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Saves data to a JSON file with secure permissions.
///
/// Creates the parent directory if needed, writes atomically
/// (via temp file + rename), and sets restrictive permissions on Unix.
///
/// # Errors
///
/// Returns an IO or serialization error.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;
    save_bytes(path, json.as_bytes()).await
}

/// Writes raw bytes with the same guarantees as [`save_json`].
///
/// # Errors
///
/// Returns an IO error.
pub async fn save_bytes(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving file");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent).await?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, bytes).await?;
    set_restrictive_permissions(&temp_path).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), "File saved securely");
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// `StoreError::NotFound` if the file is absent, `StoreError::Parse` if the
/// contents do not decode, `StoreError::Io` for anything else.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map_err(|e| StoreError::Parse(format!("{}: {e}", path.display())))
}

/// Loads data from a JSON file, returning default if not found or invalid.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !e.is_not_found() {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

/// Removes a file.
///
/// # Errors
///
/// `StoreError::NotFound` if the file is absent.
pub async fn remove_file(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Ensures a directory exists with secure permissions.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be created.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !tokio::fs::try_exists(path).await? {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        set_restrictive_dir_permissions(path).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
