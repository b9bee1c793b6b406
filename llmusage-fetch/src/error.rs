//! Fetch error types.

use thiserror::Error;

/// Longest response body kept in a [`FetchError::Status`] message.
pub(crate) const MAX_ERROR_BODY: usize = 512;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for provider fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The provider answered 2xx but reported an error in the payload.
    #[error("API error: {0}")]
    Api(String),

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A base URL or endpoint could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] llmusage_core::CoreError),
}

impl FetchError {
    /// Builds a status error, truncating long bodies.
    pub fn status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let body = match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        FetchError::Status { status, body }
    }

    /// Returns true for 401/403 responses.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, FetchError::Status { status: 401 | 403, .. })
    }

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }
}
