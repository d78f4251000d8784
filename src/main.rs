use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "zapat")]
#[command(version, about = "Activity dashboard for the Zapat GitHub automation pipeline")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Directory containing .zapat/dashboard.toml (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the activity and metrics query API
    Serve {
        /// Port to serve on (overrides ZAPAT_PORT and dashboard.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Pipeline directory containing state/ and data/
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Open the health endpoint in a browser once listening
        #[arg(long)]
        open: bool,

        /// Enable dev mode (permissive CORS, bind all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// Live terminal view of recent activity and pipeline jobs
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Print one snapshot of recent activity and pipeline jobs
    Events {
        #[command(flatten)]
        source: SourceArgs,

        /// Print {"events": [...], "metrics": [...]} instead of tables
        #[arg(long)]
        json: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Where activity comes from, plus the window to query.
#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    /// Base URL of a running `zapat serve`; reads the data directory directly when omitted
    #[arg(long, env = "ZAPAT_URL")]
    pub url: Option<String>,

    /// Pipeline directory containing state/ and data/
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Restrict to one project slug
    #[arg(short, long)]
    pub project: Option<String>,

    /// Lookback window in days
    #[arg(short, long)]
    pub days: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default dashboard.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    zapat::logging::init(cli.verbose, cli.log_json);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Serve {
            port,
            host,
            data_dir,
            open,
            dev,
        } => {
            cmd::cmd_serve(
                &project_dir,
                cmd::ServeOptions {
                    port: *port,
                    host: host.clone(),
                    data_dir: data_dir.clone(),
                    open: *open,
                    dev: *dev,
                },
            )
            .await?;
        }
        Commands::Watch {
            source,
            interval_ms,
        } => {
            cmd::cmd_watch(&project_dir, source, *interval_ms).await?;
        }
        Commands::Events { source, json } => {
            cmd::cmd_events(&project_dir, source, *json).await?;
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
