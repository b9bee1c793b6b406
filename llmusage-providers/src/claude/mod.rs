//! Claude (Anthropic) provider.
//!
//! Uses the OAuth token issued to the Claude CLI (Pro/Max subscriptions):
//!
//! ```text
//! GET https://api.anthropic.com/api/oauth/usage
//! Authorization: Bearer <access_token>
//! anthropic-beta: oauth-2025-04-20
//! ```
//!
//! Credentials come from two places, see [`crate::resolve`]:
//! - `~/.claude/.credentials.json` written by the Claude CLI
//! - `claude.json` in the llm-usage config directory (named accounts)

mod api;
mod provider;

pub use api::{API_BASE_URL, ClaudeClient, ClaudeExtraUsage, ClaudeUsageResponse, ClaudeUsageWindow};
pub use provider::ClaudeProvider;
