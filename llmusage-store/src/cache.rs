//! File-backed key/value cache with per-entry TTL.
//!
//! Used for secondary provider lookups (subscriptions) that change rarely
//! but cost an extra round-trip. One JSON file per key:
//! `{data, cached_at, expires_at}`. Anything that cannot be read back as a
//! live entry is a miss.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ring::digest::{SHA256, digest};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::persistence::{default_cache_dir, load_json, remove_file, save_json};

/// Number of hex characters of the digest kept in a hashed key.
const HASH_HEX_LEN: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    data: serde_json::Value,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Derives a filesystem-safe cache key from a secret.
///
/// Produces `"{prefix}_{first 16 hex chars of sha256(secret)}"`, so the
/// secret never appears on disk.
pub fn hash_key(prefix: &str, secret: &str) -> String {
    let hash = digest(&SHA256, secret.as_bytes());
    let hex: String = hash
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("{prefix}_{}", &hex[..HASH_HEX_LEN])
}

/// TTL cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct CacheManager {
    dir: PathBuf,
}

impl CacheManager {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a cache rooted at the default cache directory.
    pub fn open_default() -> Self {
        Self::new(default_cache_dir())
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StoreError::Config(format!("invalid cache key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Returns the cached value if present, decodable and unexpired.
    ///
    /// Expired entries are removed as a side effect.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key).ok()?;
        let entry: CacheEntry = match load_json(&path).await {
            Ok(entry) => entry,
            Err(e) => {
                if !e.is_not_found() {
                    debug!(error = %e, "Unreadable cache entry, treating as miss");
                }
                return None;
            }
        };

        if entry.is_expired() {
            debug!(expired_at = %entry.expires_at, "Cache entry expired");
            if let Err(e) = remove_file(&path).await {
                debug!(error = %e, "Failed to remove expired cache entry");
            }
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => {
                debug!("Cache hit");
                Some(value)
            }
            Err(e) => {
                debug!(error = %e, "Cached payload has unexpected shape");
                None
            }
        }
    }

    /// Stores a value for `ttl`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// `Config` for an invalid key or TTL, IO/serialization errors otherwise.
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StoreError::Config(format!("invalid cache TTL: {e}")))?;

        let cached_at = Utc::now();
        let entry = CacheEntry {
            data: serde_json::to_value(value)?,
            cached_at,
            expires_at: cached_at + ttl,
        };
        save_json(&path, &entry).await?;
        debug!(expires_at = %entry.expires_at, "Cache entry stored");
        Ok(())
    }

    /// Removes a single entry. Missing entries are not an error.
    ///
    /// # Errors
    ///
    /// IO errors other than "not found".
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match remove_file(&self.path_for(key)?).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Removes every entry and returns how many were removed.
    ///
    /// A missing directory counts as already clear.
    ///
    /// # Errors
    ///
    /// IO errors while listing or deleting.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        debug!(removed, dir = %self.dir.display(), "Cache cleared");
        Ok(removed)
    }
}
