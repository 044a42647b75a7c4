//! Provider module for chatsum
//!
//! This module contains the LLM provider abstraction and the Ollama and
//! Gemini implementations used by the summarizer.

pub mod base;
pub mod gemini;
pub mod ollama;

pub use base::{CompletionResponse, Message, Provider, TokenUsage};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{ChatsumError, Result};

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
/// (for example a missing Gemini API key).
///
/// # Examples
///
/// ```
/// use chatsum::config::ProviderConfig;
/// use chatsum::providers::create_provider;
///
/// let provider = create_provider(&ProviderConfig::default()).unwrap();
/// assert_eq!(provider.name(), "ollama");
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    let timeout = config.request_timeout_seconds;
    match config.provider_type.as_str() {
        "ollama" => Ok(Box::new(OllamaProvider::new(config.ollama.clone(), timeout)?)),
        "gemini" => Ok(Box::new(GeminiProvider::new(config.gemini.clone(), timeout)?)),
        other => Err(ChatsumError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}
