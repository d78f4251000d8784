use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::api::{self, AppState};
use super::provider::{ActivityProvider, JsonlProvider};

/// Configuration for the dashboard server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pipeline directory holding `state/` and `data/`.
    pub data_dir: PathBuf,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8420,
            data_dir: PathBuf::from("."),
            dev_mode: false,
        }
    }
}

impl ServerConfig {
    /// Dev mode listens on every interface so containers can reach it.
    pub fn bind_host(&self) -> &str {
        if self.dev_mode { "0.0.0.0" } else { &self.host }
    }
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>, dev_mode: bool) -> Router {
    let app = api::api_router().with_state(state);
    if dev_mode {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind the listener and serve until ctrl-c. `on_ready` receives the bound
/// address once the socket is open.
pub async fn start_server<F>(config: ServerConfig, on_ready: F) -> Result<()>
where
    F: FnOnce(SocketAddr) + Send,
{
    let provider: Arc<dyn ActivityProvider> = Arc::new(JsonlProvider::new(&config.data_dir));
    let state = Arc::new(AppState::new(provider));
    let app = build_router(state, config.dev_mode);

    let addr = format!("{}:{}", config.bind_host(), config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        data_dir = %config.data_dir.display(),
        dev = config.dev_mode,
        "activity dashboard listening"
    );
    on_ready(local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
