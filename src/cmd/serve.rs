//! Query API server command — `zapat serve`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use zapat::activity::server::{ServerConfig, start_server};

pub struct ServeOptions {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub open: bool,
    pub dev: bool,
}

pub async fn cmd_serve(project_dir: &Path, opts: ServeOptions) -> Result<()> {
    let config = super::load_config(project_dir)?;

    let server_config = ServerConfig {
        host: opts.host.unwrap_or_else(|| config.server.host.clone()),
        port: opts.port.unwrap_or_else(|| config.port()),
        data_dir: opts.data_dir.unwrap_or_else(|| config.data_dir()),
        dev_mode: opts.dev,
    };

    // No browser inside dev containers.
    let open_browser = opts.open && !opts.dev;
    start_server(server_config, move |addr| {
        println!("Zapat dashboard API listening on http://{}", addr);
        if open_browser {
            let url = format!("http://localhost:{}/health", addr.port());
            tokio::spawn(async move {
                if let Err(e) = open::that(&url) {
                    tracing::warn!(error = %e, %url, "failed to open browser");
                }
            });
        }
    })
    .await
}
