//! CLI module for Pulseboard
//!
//! # Commands
//!
//! - `serve` - Run the dashboard server (stream client, API, proxy)
//! - `watch` - Follow the snapshot stream in the terminal
//! - `config` - Configuration utilities (init)
//!
//! # Example
//!
//! ```bash
//! # Serve the dashboard in front of a probe backend
//! pulseboard serve --upstream https://probe.example.com
//!
//! # Print one snapshot as JSON and exit
//! pulseboard watch --url wss://probe.example.com/api/v1/ws/server --once --json
//! ```

pub mod config;
pub mod output;
pub mod serve;
pub mod watch;

pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pulseboard - real-time server monitoring dashboard backend
#[derive(Parser, Debug)]
#[command(
    name = "pulseboard",
    version,
    about = "Real-time data layer for a server monitoring dashboard"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dashboard server
    Serve(ServeArgs),
    /// Follow the snapshot stream and print each update
    Watch(WatchArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "pulseboard.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "PULSEBOARD_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "PULSEBOARD_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PULSEBOARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Probe backend base URL
    #[arg(long, env = "PULSEBOARD_UPSTREAM_URL")]
    pub upstream: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stream URL (ws:// or wss://); overrides the config file
    #[arg(short, long, env = "PULSEBOARD_STREAM_URL")]
    pub url: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "pulseboard.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit after the first snapshot
    #[arg(long)]
    pub once: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "pulseboard.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}
