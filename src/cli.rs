//! Command-line interface definition for chatsum
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// chatsum - scheduled group chats with on-demand LLM summaries
#[derive(Parser, Debug, Clone)]
#[command(name = "chatsum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "CHATSUM_JSON_LOGS")]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for chatsum
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the listen address (e.g. 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Validate the configuration
    Config {
        /// Print the effective configuration as YAML
        #[arg(long)]
        show: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
