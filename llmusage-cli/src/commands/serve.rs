//! Serve command - usage over HTTP.
//!
//! Routes:
//!
//! - `GET /api/v1/usage?provider=&account=` fetches on every request
//! - `GET /api/v1/providers` lists configured providers and accounts
//! - `GET /health`

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use clap::Args;
use llmusage_fetch::fetch_all;
use llmusage_providers::ProviderResolver;
use llmusage_store::Settings;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info};

use super::default_resolver;
use crate::ExitCode;

/// Arguments for the serve command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind (defaults to the configured server host).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (defaults to the configured server port).
    #[arg(long)]
    pub port: Option<u16>,
}

/// Query string accepted by the usage route.
#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    /// Provider filter, empty for all.
    #[serde(default)]
    pub provider: String,
    /// Account filter, empty for all.
    #[serde(default)]
    pub account: String,
}

type SharedResolver = Arc<ProviderResolver>;

/// Runs the HTTP server until interrupted.
pub async fn run(args: &ServeArgs, settings: &Settings) -> Result<ExitCode> {
    let host = args.host.as_deref().unwrap_or(&settings.server.host);
    let port = args.port.unwrap_or(settings.server.port);
    let addr = format!("{host}:{port}");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Serving usage API");
    eprintln!("Listening on http://{addr}");

    axum::serve(listener, router(default_resolver(settings)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(ExitCode::Success)
}

/// Builds the API router over a resolver.
pub fn router(resolver: ProviderResolver) -> Router {
    Router::new()
        .route("/api/v1/usage", get(usage))
        .route("/api/v1/providers", get(providers))
        .route("/health", get(health))
        .with_state(Arc::new(resolver))
}

async fn usage(
    State(resolver): State<SharedResolver>,
    Query(query): Query<UsageQuery>,
) -> impl IntoResponse {
    debug!(provider = %query.provider, account = %query.account, "Usage request");
    let instances = resolver
        .resolve(&query.provider, &query.account, false)
        .await;
    let stats = fetch_all(&instances).await;
    ([(header::CACHE_CONTROL, "no-cache")], Json(stats))
}

async fn providers(State(resolver): State<SharedResolver>) -> impl IntoResponse {
    Json(resolver.list_configured().await)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!(error = %e, "Cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmusage_core::ProviderKind;
    use llmusage_fetch::HttpClient;
    use llmusage_providers::ProviderContext;
    use llmusage_store::{CacheManager, CredentialStore};
    use serde_json::Value;
    use tempfile::TempDir;

    async fn spawn(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn resolver(dir: &TempDir) -> ProviderResolver {
        let ctx = ProviderContext::new(HttpClient::new(), CacheManager::new(dir.path().join("cache")));
        ProviderResolver::new(CredentialStore::new(dir.path().join("config")), ctx)
            .with_claude_cli_path(None)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let base = spawn(router(resolver(&dir))).await;

        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_usage_with_nothing_configured() {
        let dir = TempDir::new().unwrap();
        let base = spawn(router(resolver(&dir))).await;

        let resp = reqwest::get(format!("{base}/api/v1/usage")).await.unwrap();
        assert_eq!(
            resp.headers().get("cache-control").and_then(|v| v.to_str().ok()),
            Some("no-cache")
        );
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"providers": []}));
    }

    #[tokio::test]
    async fn test_usage_and_providers_routes() {
        let vendor = Router::new().route(
            "/api/monitor/usage/quota/limit",
            get(|| async {
                Json(json!({"data": {"limits": [
                    {"type": "TOKENS_LIMIT", "usage": 1000, "currentValue": 250}
                ]}}))
            }),
        );
        let vendor_base = spawn(vendor).await;

        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(
            dir.path().join("config/zai.json"),
            r#"{"accounts":{"work":{"apiKey":"k1"},"home":{"apiKey":"k2"}}}"#,
        )
        .unwrap();
        let resolver = resolver(&dir).with_base_url(ProviderKind::Zai, vendor_base);
        let base = spawn(router(resolver)).await;

        let body: Value = reqwest::get(format!("{base}/api/v1/usage?provider=zai&account=work"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let providers = body["providers"].as_array().unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0]["provider"], "zai");
        assert_eq!(providers[0]["extra"]["account"], "work");
        assert_eq!(providers[0]["windows"][0]["label"], "Tokens Limit");
        assert_eq!(providers[0]["windows"][0]["utilization"], 25.0);

        let body: Value = reqwest::get(format!("{base}/api/v1/providers"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            body,
            json!([{"id": "zai", "name": "Z.AI", "accounts": ["home", "work"]}])
        );
    }
}
