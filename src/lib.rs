//! chatsum - scheduled group chats with on-demand LLM summaries
//!
//! # Architecture
//!
//! - `chat`: chat records, derived status and membership
//! - `messages`: append-only per-chat message log (sled)
//! - `summarizer`: prompt building, bounded LLM calls and digest caching
//! - `providers`: LLM back-ends (Ollama, Gemini)
//! - `accounts` / `identity`: signup, user lookup and bearer tokens
//! - `service`: credentialed entry points used by the HTTP layer
//! - `server`: axum routes
//! - `storage`: SQLite store for users, chats and participants
//! - `config`, `cli`, `logging`, `error`: ambient plumbing
//!
//! # Example
//!
//! ```no_run
//! use chatsum::cli::{Cli, Commands};
//! use chatsum::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli {
//!         config: None,
//!         verbose: false,
//!         json_logs: false,
//!         command: Commands::Serve { bind: None },
//!     };
//!     let config = Config::load("config/config.yaml", &cli)?;
//!     config.validate()?;
//!     chatsum::server::serve(&config).await
//! }
//! ```

pub mod accounts;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod messages;
pub mod providers;
pub mod server;
pub mod service;
pub mod storage;
pub mod summarizer;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatsumError, Result};
pub use service::ChatService;

#[cfg(test)]
pub mod test_utils;
