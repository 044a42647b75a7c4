//! chatsum - scheduled group chats with on-demand LLM summaries
//!
//! Main entry point for the chatsum API server.

use anyhow::Result;

use chatsum::cli::{Cli, Commands};
use chatsum::config::Config;
use chatsum::logging::{init_logging, LoggingOptions};
use chatsum::summarizer::metrics::init_metrics_exporter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(&LoggingOptions::from_cli(&cli))?;

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match &cli.command {
        Commands::Serve { .. } => {
            tracing::info!(
                bind = %config.server.bind,
                provider = %config.provider.provider_type,
                "Starting chatsum server"
            );
            init_metrics_exporter();
            chatsum::server::serve(&config).await?;
        }
        Commands::Config { show } => {
            if *show {
                print!("{}", serde_yaml::to_string(&config)?);
            } else {
                println!("Configuration OK ({})", config_path);
            }
        }
    }

    Ok(())
}
