pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "postwatch")]
#[command(about = "Watch a social-media page and forward new posts to a chat bot", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/postwatch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (default: ~/.local/share/postwatch/postwatch.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single tick: scrape, filter, deliver and record
    Run,
    /// Scrape and show which posts would be delivered, without sending or recording
    Preview,
    /// Forget every notified post
    Clear,
    /// List recently notified post ids
    Notified {
        /// Maximum number of ids to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Background daemon for the refresh cycle
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum DaemonAction {
    /// Start the refresh cycle in the foreground
    Start {
        /// Refresh interval overriding the config (e.g., "30s", "2m", "1h")
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the initial tick on start
        #[arg(long)]
        no_initial_tick: bool,

        /// Log file path (default: stdout)
        #[arg(short, long)]
        log: Option<PathBuf>,
    },
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Validate the config file
    Check,
}
