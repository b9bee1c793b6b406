//! Provider-related types.
//!
//! [`ProviderKind`] is the closed set of vendors the aggregator knows how to
//! talk to. Parsing is lenient: unknown ids yield `None` so callers can skip
//! them instead of failing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported LLM provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Claude (OAuth subscription)
    Claude,
    /// Moonshot Kimi (API key)
    Kimi,
    /// Z.AI (API key)
    Zai,
    /// MiniMax (session cookie + group id)
    MiniMax,
}

impl ProviderKind {
    /// Returns the stable lowercase id used in files, flags and JSON.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Kimi => "kimi",
            Self::Zai => "zai",
            Self::MiniMax => "minimax",
        }
    }

    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Kimi => "Kimi",
            Self::Zai => "Z.AI",
            Self::MiniMax => "MiniMax",
        }
    }

    /// Returns the longer name shown in text headers.
    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude (Pro/Max Subscription)",
            other => other.display_name(),
        }
    }

    /// Returns the one-letter prefix used in compact status-bar text.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Claude => "C",
            Self::Kimi => "K",
            Self::Zai => "Z",
            Self::MiniMax => "M",
        }
    }

    /// Returns all provider kinds in canonical order.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Claude, Self::Kimi, Self::Zai, Self::MiniMax]
    }

    /// Looks up a provider by id, case-insensitively. Unknown ids yield `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::all()
            .iter()
            .copied()
            .find(|k| k.id().eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| CoreError::ProviderNotFound(s.to_string()))
    }
}

/// Returns the short status-bar prefix for an arbitrary provider id.
///
/// Unknown ids fall back to their first character, uppercased.
pub fn short_name_for(id: &str) -> String {
    match ProviderKind::from_id(id) {
        Some(kind) => kind.short_name().to_string(),
        None => id
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default(),
    }
}

/// Returns the display name for an arbitrary provider id.
pub fn display_name_for(id: &str) -> String {
    ProviderKind::from_id(id).map_or_else(|| id.to_string(), |k| k.display_name().to_string())
}
