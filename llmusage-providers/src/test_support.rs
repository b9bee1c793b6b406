//! Helpers for adapter tests: an in-process vendor API.

use axum::Router;
use llmusage_fetch::HttpClient;
use llmusage_store::CacheManager;
use tempfile::TempDir;

use crate::context::ProviderContext;

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_mock(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Context with a throwaway cache directory. Keep the `TempDir` alive.
pub fn test_context() -> (ProviderContext, TempDir) {
    let dir = TempDir::new().unwrap();
    let ctx = ProviderContext::new(HttpClient::new(), CacheManager::new(dir.path()));
    (ctx, dir)
}
