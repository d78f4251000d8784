//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `serve`  | `Serve`          |
//! | `watch`  | `Watch`          |
//! | `events` | `Events`         |
//! | `config` | `Config`         |

pub mod config;
pub mod events;
pub mod serve;
pub mod watch;

pub use config::cmd_config;
pub use events::cmd_events;
pub use serve::{ServeOptions, cmd_serve};
pub use watch::cmd_watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use zapat::activity::client::{ApiClient, ProviderSource};
use zapat::activity::provider::JsonlProvider;
use zapat::activity::query::{RawWindowParams, WindowQuery};
use zapat::config::DashboardToml;

use crate::SourceArgs;

/// Discover dashboard.toml and log its warnings.
pub(crate) fn load_config(project_dir: &Path) -> Result<DashboardToml> {
    let config = DashboardToml::discover(project_dir)?;
    for warning in config.validate() {
        tracing::warn!(%warning, "dashboard config");
    }
    Ok(config)
}

/// Validate `--project`/`--days` the same way the query API does. Without
/// `--days` the configured default applies.
pub(crate) fn window_query(args: &SourceArgs, config: &DashboardToml) -> Result<WindowQuery> {
    let raw = RawWindowParams {
        days: args.days.clone(),
        project: args.project.clone(),
    };
    let mut query = WindowQuery::from_raw(&raw)?;
    if args.days.is_none() {
        query.days = config.dashboard.default_days;
    }
    Ok(query)
}

/// A running server when `--url` is given, otherwise the data directory.
pub(crate) enum Source {
    Remote(ApiClient),
    Local(ProviderSource),
}

pub(crate) fn resolve_source(args: &SourceArgs, config: &DashboardToml) -> Result<Source> {
    if let Some(ref url) = args.url {
        let client = ApiClient::new(url)?;
        tracing::debug!(url = client.base_url(), "reading activity from server");
        return Ok(Source::Remote(client));
    }
    let data_dir = args.data_dir.clone().unwrap_or_else(|| config.data_dir());
    tracing::debug!(data_dir = %data_dir.display(), "reading activity from data directory");
    Ok(Source::Local(ProviderSource::new(Arc::new(
        JsonlProvider::new(data_dir),
    ))))
}
