//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the level comes from the CLI
//! (`chatsum=info`, or `chatsum=debug` with `--verbose`).

use crate::cli::Cli;
use crate::error::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How log lines are filtered and formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Fallback filter directive when `RUST_LOG` is unset
    pub level: String,
    /// One JSON object per line instead of human-readable text
    pub json_format: bool,
}

impl LoggingOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        let level = if cli.verbose {
            "chatsum=debug,tower_http=debug"
        } else {
            "chatsum=info"
        };
        Self {
            level: level.to_string(),
            json_format: cli.json_logs,
        }
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails on an invalid filter directive or when a subscriber is already set.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&options.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if options.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;

    fn cli(verbose: bool, json_logs: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            json_logs,
            command: Commands::Config { show: false },
        }
    }

    #[test]
    fn test_options_default_to_info_text() {
        let options = LoggingOptions::from_cli(&cli(false, false));
        assert_eq!(options.level, "chatsum=info");
        assert!(!options.json_format);
    }

    #[test]
    fn test_verbose_json_options() {
        let options = LoggingOptions::from_cli(&cli(true, true));
        assert!(options.level.starts_with("chatsum=debug"));
        assert!(options.json_format);
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let options = LoggingOptions {
            level: "chatsum=info".to_string(),
            json_format: false,
        };
        let _ = init_logging(&options);
        assert!(init_logging(&options).is_err());
    }
}
