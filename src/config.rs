//! Dashboard configuration.
//!
//! Read from `.zapat/dashboard.toml` in the project directory, falling back
//! to `<user config dir>/zapat/dashboard.toml`. Every section is optional.
//! Precedence is file → environment → CLI flag.
//!
//! ```toml
//! [server]
//! port = 8420
//! host = "127.0.0.1"
//! data_dir = "/opt/zapat"
//!
//! [dashboard]
//! refresh_interval_ms = 10000
//! default_days = 7
//! github_base_url = "https://github.com"
//! metrics_display_limit = 50
//!
//! [event_types.custom_step]
//! label = "Custom Step"
//! category = "indigo"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::activity::catalog::{EventCatalog, EventStyle};
use crate::activity::metrics_table::METRICS_DISPLAY_LIMIT;
use crate::activity::query::DEFAULT_DAYS;

pub const CONFIG_DIR: &str = ".zapat";
pub const CONFIG_FILE: &str = "dashboard.toml";

/// Polls faster than this are allowed but flagged by `validate`.
const MIN_SANE_REFRESH_MS: u64 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Pipeline directory containing `state/` and `data/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    8420
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSection {
    /// Interval shared by the events and metrics polls.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_days")]
    pub default_days: u32,
    #[serde(default = "default_github_base_url")]
    pub github_base_url: String,
    #[serde(default = "default_metrics_display_limit")]
    pub metrics_display_limit: usize,
}

fn default_refresh_interval_ms() -> u64 {
    10_000
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

fn default_github_base_url() -> String {
    "https://github.com".to_string()
}

fn default_metrics_display_limit() -> usize {
    METRICS_DISPLAY_LIMIT
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            default_days: default_days(),
            github_base_url: default_github_base_url(),
            metrics_display_limit: default_metrics_display_limit(),
        }
    }
}

/// The complete dashboard.toml structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub dashboard: DashboardSection,
    /// Extra or replacement entries for the event catalog, keyed by type code.
    #[serde(default)]
    pub event_types: BTreeMap<String, EventStyle>,
}

impl DashboardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse dashboard.toml")
    }

    /// Project config, then user config, then defaults.
    pub fn discover(project_dir: &Path) -> Result<Self> {
        match Self::locate(project_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading dashboard config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// First existing config file, if any.
    pub fn locate(project_dir: &Path) -> Option<PathBuf> {
        let project = project_dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if project.exists() {
            return Some(project);
        }
        dirs::config_dir()
            .map(|dir| dir.join("zapat").join(CONFIG_FILE))
            .filter(|path| path.exists())
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize dashboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Port, with `ZAPAT_PORT` overriding the file.
    pub fn port(&self) -> u16 {
        std::env::var("ZAPAT_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.server.port)
    }

    /// Data directory, with `ZAPAT_DATA_DIR` overriding the file.
    pub fn data_dir(&self) -> PathBuf {
        std::env::var_os("ZAPAT_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| self.server.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Poll interval, with `ZAPAT_REFRESH_INTERVAL_MS` overriding the file.
    /// Zero is not a valid interval and falls back to the default.
    pub fn refresh_interval(&self) -> Duration {
        let ms = std::env::var("ZAPAT_REFRESH_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(self.dashboard.refresh_interval_ms);
        let ms = if ms == 0 { default_refresh_interval_ms() } else { ms };
        Duration::from_millis(ms)
    }

    /// Built-in catalog plus `[event_types]`.
    pub fn catalog(&self) -> EventCatalog {
        EventCatalog::with_overrides(self.event_types.clone())
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let refresh = self.dashboard.refresh_interval_ms;
        if refresh == 0 {
            warnings.push(format!(
                "dashboard.refresh_interval_ms is 0; using {}ms",
                default_refresh_interval_ms()
            ));
        } else if refresh < MIN_SANE_REFRESH_MS {
            warnings.push(format!(
                "dashboard.refresh_interval_ms = {} polls more than once per second",
                refresh
            ));
        }
        if self.dashboard.metrics_display_limit == 0 {
            warnings.push("dashboard.metrics_display_limit is 0; the jobs table will be empty".into());
        }
        if !self.dashboard.github_base_url.starts_with("http://")
            && !self.dashboard.github_base_url.starts_with("https://")
        {
            warnings.push(format!(
                "dashboard.github_base_url '{}' is not an http(s) URL",
                self.dashboard.github_base_url
            ));
        }
        for (code, style) in &self.event_types {
            if style.label.trim().is_empty() {
                warnings.push(format!("event_types.{} has an empty label", code));
            }
        }
        if let Some(ref dir) = self.server.data_dir {
            if !dir.exists() {
                warnings.push(format!("server.data_dir {} does not exist", dir.display()));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::catalog::Category;
    use crate::activity::models::EventKind;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = DashboardToml::default();
        assert_eq!(config.server.port, 8420);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.dashboard.refresh_interval_ms, 10_000);
        assert_eq!(config.dashboard.default_days, 7);
        assert_eq!(config.dashboard.metrics_display_limit, 50);
        assert!(config.event_types.is_empty());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = DashboardToml::parse(
            r#"
            [dashboard]
            refresh_interval_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.dashboard.refresh_interval_ms, 5000);
        assert_eq!(config.dashboard.default_days, 7);
        assert_eq!(config.server.port, 8420);
    }

    #[test]
    fn test_event_types_extend_catalog() {
        let config = DashboardToml::parse(
            r#"
            [event_types.custom_step]
            label = "Custom Step"
            category = "indigo"

            [event_types.pr_merged]
            label = "Landed"
            category = "green"
            "#,
        )
        .unwrap();
        let catalog = config.catalog();
        let custom = catalog.style_for(&EventKind::from("custom_step"));
        assert_eq!(custom.label, "Custom Step");
        assert_eq!(custom.category, Category::Indigo);
        assert_eq!(catalog.style_for(&EventKind::PrMerged).label, "Landed");
        assert_eq!(catalog.style_for(&EventKind::PrCreated).label, "PR Created");
    }

    #[test]
    fn test_invalid_category_rejected() {
        let result = DashboardToml::parse(
            r#"
            [event_types.x]
            label = "X"
            category = "chartreuse"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let mut config = DashboardToml::default();
        config.dashboard.refresh_interval_ms = 200;
        config.dashboard.github_base_url = "github.com".to_string();
        config
            .event_types
            .insert("blank".to_string(), EventStyle::new(" ", Category::Blue));
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("more than once per second"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);
        let mut config = DashboardToml::default();
        config.server.port = 9000;
        config.save(&path).unwrap();

        let loaded = DashboardToml::load(&path).unwrap();
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_discover_prefers_project_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();

        let config = DashboardToml::discover(dir.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(DashboardToml::locate(dir.path()), Some(path));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = DashboardToml::default();

        // SAFETY: ENV_MUTEX serialises every test touching these variables.
        unsafe {
            std::env::set_var("ZAPAT_PORT", "9999");
            std::env::set_var("ZAPAT_DATA_DIR", "/srv/zapat");
            std::env::set_var("ZAPAT_REFRESH_INTERVAL_MS", "2500");
        }
        assert_eq!(config.port(), 9999);
        assert_eq!(config.data_dir(), PathBuf::from("/srv/zapat"));
        assert_eq!(config.refresh_interval(), Duration::from_millis(2500));

        unsafe {
            std::env::set_var("ZAPAT_PORT", "not-a-port");
            std::env::remove_var("ZAPAT_DATA_DIR");
            std::env::set_var("ZAPAT_REFRESH_INTERVAL_MS", "0");
        }
        assert_eq!(config.port(), 8420);
        assert_eq!(config.data_dir(), PathBuf::from("."));
        assert_eq!(config.refresh_interval(), Duration::from_millis(10_000));

        unsafe {
            std::env::remove_var("ZAPAT_PORT");
            std::env::remove_var("ZAPAT_REFRESH_INTERVAL_MS");
        }
    }
}
