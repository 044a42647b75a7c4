//! Configuration management for chatsum
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatsumError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Largest retry count the summarizer honours
pub const MAX_SUMMARY_RETRIES: u32 = 1;

/// Main configuration structure for chatsum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Where records and messages are stored
    #[serde(default)]
    pub storage: StorageConfig,
    /// LLM provider configuration (Ollama, Gemini)
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Summarization behaviour
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API listens on
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Storage locations
///
/// Unset paths resolve under the user's data directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database for users, chats and participants
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// sled directory for the message log
    #[serde(default)]
    pub message_log_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Message log directory, falling back to the data directory
    pub fn resolved_message_log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.message_log_path {
            return Ok(path.clone());
        }
        let proj_dirs = ProjectDirs::from("dev", "chatsum", "chatsum")
            .ok_or_else(|| ChatsumError::Config("Could not determine data directory".into()))?;
        Ok(proj_dirs.data_dir().join("messages"))
    }
}

/// Provider configuration
///
/// Specifies which LLM provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// HTTP client timeout for provider calls (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_provider_type() -> String {
    "ollama".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            ollama: OllamaConfig::default(),
            gemini: GeminiConfig::default(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Google Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API base URL (overridable for tests and proxies)
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// Model to use for Gemini
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API key; usually supplied through `GEMINI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_gemini_temperature")]
    pub temperature: f32,
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_temperature() -> f32 {
    0.7
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: default_gemini_api_base(),
            model: default_gemini_model(),
            api_key: None,
            temperature: default_gemini_temperature(),
        }
    }
}

/// Summarizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Number of latest messages fed to the model
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Hard bound on each LLM attempt (seconds)
    #[serde(default = "default_summary_timeout")]
    pub timeout_seconds: u64,

    /// Retries after a transient failure; at most one is honoured
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Reuse a digest while the chat has no new messages
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// Most digests kept; least recently used are evicted first
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_window_size() -> usize {
    1000
}

fn default_summary_timeout() -> u64 {
    8
}

fn default_max_retries() -> u32 {
    1
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    256
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            timeout_seconds: default_summary_timeout(),
            max_retries: default_max_retries(),
            cache_enabled: default_cache_enabled(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatsumError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatsumError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(bind) = std::env::var("CHATSUM_BIND") {
            self.server.bind = bind;
        }

        if let Ok(db) = std::env::var(crate::storage::DATABASE_ENV) {
            self.storage.database_path = Some(PathBuf::from(db));
        }

        if let Ok(log) = std::env::var("CHATSUM_MESSAGE_LOG") {
            self.storage.message_log_path = Some(PathBuf::from(log));
        }

        if let Ok(provider_type) = std::env::var("CHATSUM_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(ollama_host) = std::env::var("CHATSUM_OLLAMA_HOST") {
            self.provider.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("CHATSUM_OLLAMA_MODEL") {
            self.provider.ollama.model = ollama_model;
        }

        if let Ok(gemini_model) = std::env::var("CHATSUM_GEMINI_MODEL") {
            self.provider.gemini.model = gemini_model;
        }

        if let Ok(key) =
            std::env::var("CHATSUM_GEMINI_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY"))
        {
            self.provider.gemini.api_key = Some(key);
        }

        if let Ok(window) = std::env::var("CHATSUM_SUMMARY_WINDOW") {
            if let Ok(value) = window.parse() {
                self.summarizer.window_size = value;
            } else {
                tracing::warn!("Invalid CHATSUM_SUMMARY_WINDOW: {}", window);
            }
        }

        if let Ok(timeout) = std::env::var("CHATSUM_SUMMARY_TIMEOUT") {
            if let Ok(value) = timeout.parse() {
                self.summarizer.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CHATSUM_SUMMARY_TIMEOUT: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let crate::cli::Commands::Serve {
            bind: Some(bind), ..
        } = &cli.command
        {
            self.server.bind = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ChatsumError::Config` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        self.server.bind.parse::<SocketAddr>().map_err(|e| {
            ChatsumError::Config(format!("Invalid bind address {}: {}", self.server.bind, e))
        })?;

        let valid_providers = ["ollama", "gemini"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(ChatsumError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        url::Url::parse(&self.provider.ollama.host).map_err(|e| {
            ChatsumError::Config(format!("Invalid ollama.host {}: {}", self.provider.ollama.host, e))
        })?;
        url::Url::parse(&self.provider.gemini.api_base).map_err(|e| {
            ChatsumError::Config(format!(
                "Invalid gemini.api_base {}: {}",
                self.provider.gemini.api_base, e
            ))
        })?;

        if self.provider.request_timeout_seconds == 0 {
            return Err(ChatsumError::Config(
                "provider.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.summarizer.cache_capacity == 0 {
            return Err(ChatsumError::Config(
                "summarizer.cache_capacity must be greater than 0".to_string(),
            )
            .into());
        }

        if self.summarizer.window_size == 0 {
            return Err(ChatsumError::Config(
                "summarizer.window_size must be greater than 0".to_string(),
            )
            .into());
        }

        if self.summarizer.timeout_seconds == 0 || self.summarizer.timeout_seconds > 120 {
            return Err(ChatsumError::Config(
                "summarizer.timeout_seconds must be between 1 and 120".to_string(),
            )
            .into());
        }

        if self.summarizer.max_retries > MAX_SUMMARY_RETRIES {
            return Err(ChatsumError::Config(format!(
                "summarizer.max_retries must be at most {}",
                MAX_SUMMARY_RETRIES
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            provider: ProviderConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }
}
