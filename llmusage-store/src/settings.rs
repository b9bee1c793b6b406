//! User preferences.
//!
//! Stored as `settings.json` next to the credential documents. Every field
//! has a default so a missing or partial file is fine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{load_json, save_json};

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Provider filter used when none is given on the command line.
    pub default_provider: String,

    /// How long subscription lookups stay cached, in minutes.
    pub subscription_cache_ttl_minutes: u64,

    /// Log level used when neither `--verbose` nor `--quiet` is given.
    pub log_level: LogLevel,

    /// HTTP API settings.
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_provider: "all".to_string(),
            subscription_cache_ttl_minutes: 30,
            log_level: LogLevel::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Returns the subscription cache TTL.
    pub fn subscription_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.subscription_cache_ttl_minutes.saturating_mul(60))
    }

    /// Loads settings. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// `Parse` if the file is malformed, IO errors otherwise. Callers fall
    /// back to [`Settings::default`] and report the error once logging is up.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        match load_json(path).await {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded settings");
                Ok(settings)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Settings file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

/// HTTP API bind settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}
