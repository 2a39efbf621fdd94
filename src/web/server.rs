//! Web server for Academia.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::SharedDatabase;
use crate::storage::SharedObjectStore;
use crate::{AcademiaError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Per-IP rate limiters.
    rate_limits: Arc<RateLimitState>,
    /// Configuration the router is built from.
    config: Config,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: SharedDatabase, store: SharedObjectStore) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port)
            .parse()
            .map_err(|e| AcademiaError::Config(format!("invalid web server address: {e}")))?;

        let tokens = Arc::new(TokenIssuer::new(
            &config.web.jwt_secret,
            config.web.jwt_expiry_secs,
        ));
        let app_state = AppState::new(db, store, tokens)
            .with_max_upload_size(config.storage.max_upload_size_bytes());

        let rate_limits = Arc::new(RateLimitState::new(
            config.web.login_rate_limit,
            config.web.api_rate_limit,
        ));

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            rate_limits,
            config: config.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn bind(self) -> std::io::Result<(TcpListener, axum::Router)> {
        let listener = TcpListener::bind(self.addr).await?;
        self.rate_limits.start_cleanup_task();
        let router = create_router(self.app_state, self.rate_limits, &self.config.web);
        Ok((listener, router))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router) = self.bind().await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseProvider};
    use crate::storage::LocalObjectStore;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.web.host = "127.0.0.1".to_string();
        config.web.port = 0;
        config.web.jwt_secret = "test-secret-key".to_string();
        config
    }

    async fn create_test_server(config: &Config, files: &std::path::Path) -> WebServer {
        let db = Database::open_in_memory().await.unwrap();
        let store = LocalObjectStore::new(files, "http://127.0.0.1").unwrap();
        WebServer::new(
            config,
            Arc::new(DatabaseProvider::from_database(db)),
            Arc::new(store),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(&create_test_config(), dir.path()).await;
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_host() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config();
        config.web.host = "not an address".to_string();

        let db = Database::open_in_memory().await.unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://127.0.0.1").unwrap();
        let result = WebServer::new(
            &config,
            Arc::new(DatabaseProvider::from_database(db)),
            Arc::new(store),
        );
        assert!(matches!(result, Err(AcademiaError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(&create_test_config(), dir.path()).await;
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }
}
