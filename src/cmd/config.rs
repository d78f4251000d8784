//! Configuration view and validation commands — `zapat config`.

use std::path::Path;

use anyhow::Result;
use zapat::config::{CONFIG_DIR, CONFIG_FILE, DashboardToml};

use crate::ConfigCommands;

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = project_dir.join(CONFIG_DIR).join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Zapat Dashboard Configuration");
            println!("=============================");
            println!();

            let toml = match DashboardToml::locate(project_dir) {
                Some(path) => {
                    println!("Config file: {}", path.display());
                    DashboardToml::load(&path)?
                }
                None => {
                    println!("No dashboard.toml found at {}", config_path.display());
                    println!("Using default configuration.");
                    DashboardToml::default()
                }
            };
            println!();

            println!("[server]");
            println!("  port = {}", toml.server.port);
            println!("  host = \"{}\"", toml.server.host);
            if let Some(ref dir) = toml.server.data_dir {
                println!("  data_dir = \"{}\"", dir.display());
            }
            println!();

            println!("[dashboard]");
            println!("  refresh_interval_ms = {}", toml.dashboard.refresh_interval_ms);
            println!("  default_days = {}", toml.dashboard.default_days);
            println!("  github_base_url = \"{}\"", toml.dashboard.github_base_url);
            println!(
                "  metrics_display_limit = {}",
                toml.dashboard.metrics_display_limit
            );
            println!();

            println!("Event types:");
            for (code, style) in toml.catalog().entries() {
                println!("  {:<16} {:<14} {}", code, style.label, style.category.as_str());
            }
            println!();

            println!("Effective values (with env overrides):");
            println!("  port = {}", toml.port());
            println!("  data_dir = \"{}\"", toml.data_dir().display());
            println!(
                "  refresh_interval_ms = {}",
                toml.refresh_interval().as_millis()
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let Some(path) = DashboardToml::locate(project_dir) else {
                println!("No dashboard.toml found. Using defaults (valid).");
                return Ok(());
            };

            let toml = DashboardToml::load(&path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("dashboard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            DashboardToml::default().save(&config_path)?;

            println!("Created dashboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] port, host, data_dir");
            println!("  - [dashboard] refresh_interval_ms, default_days, github_base_url");
            println!("  - [event_types.<code>] label, category for new event types");
            println!();
        }
    }

    Ok(())
}
