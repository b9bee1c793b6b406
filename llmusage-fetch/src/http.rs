//! HTTP client shared by all provider clients.
//!
//! Wraps `reqwest` with the policy every vendor call follows:
//! - fixed request timeout, no retries
//! - non-2xx responses become [`FetchError::Status`] with the body attached
//! - bodies that do not decode become [`FetchError::InvalidResponse`]

use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string sent with every request.
pub const USER_AGENT: &str = concat!("llm-usage/", env!("CARGO_PKG_VERSION"));

/// Builds an endpoint URL from a base, a path and query pairs.
///
/// The base may carry a trailing slash and its own path prefix.
///
/// # Errors
///
/// `FetchError::InvalidUrl` if the result does not parse.
pub fn endpoint(base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url, FetchError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and uniform error mapping.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with the default 30 second timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This only happens when
    /// the TLS backend cannot initialize, in which case no request could
    /// succeed anyway.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to create HTTP client: {e}. \
                    This usually indicates a broken TLS/SSL configuration."
                )
            });

        Self { inner: client }
    }

    /// Performs a GET request and decodes a JSON body.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures as [`FetchError`].
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        debug!("GET request");
        let request = with_headers(self.inner.get(url.clone()), headers);
        read_json(request.send().await?).await
    }

    /// Performs a POST request with a JSON body and decodes a JSON body.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures as [`FetchError`].
    #[instrument(skip(self, headers, body), fields(url = %url))]
    pub async fn post_json<B, T>(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST request with JSON");
        let request = with_headers(self.inner.post(url.clone()), headers).json(body);
        read_json(request.send().await?).await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, &str)]) -> RequestBuilder {
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    request
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();
    debug!(status = %status, "Response received");

    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(FetchError::status(
            status.as_u16(),
            &String::from_utf8_lossy(&bytes),
        ));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| FetchError::InvalidResponse(format!("failed to parse response: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
