//! Google Gemini provider implementation for chatsum
//!
//! Calls the `generateContent` REST endpoint. System messages are sent as
//! the request's `systemInstruction`; the remaining turns become `contents`.

use crate::config::GeminiConfig;
use crate::error::{ChatsumError, Result};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// # Errors
    ///
    /// Returns `ChatsumError::MissingCredentials` when no API key is
    /// configured, or a provider error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig, timeout_seconds: u64) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ChatsumError::MissingCredentials("gemini".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("chatsum/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatsumError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Gemini provider: model={}", config.model);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn build_request(&self, messages: &[Message]) -> GenerateContentRequest {
        let mut system = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            let Some(text) = message.content.clone() else {
                continue;
            };
            match message.role.as_str() {
                "system" => system.push(GeminiPart { text }),
                "assistant" => contents.push(GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![GeminiPart { text }],
                }),
                _ => contents.push(GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![GeminiPart { text }],
                }),
            }
        }

        GenerateContentRequest {
            system_instruction: (!system.is_empty()).then(|| GeminiContent {
                role: None,
                parts: system,
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );
        let request = self.build_request(messages);

        tracing::debug!("Sending Gemini request: {} contents", request.contents.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request failed: {}", e);
                ChatsumError::Provider(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini rejected credentials ({}): {}", status, error_text);
            return Err(ChatsumError::Authentication(format!(
                "Gemini returned {}: {}",
                status, error_text
            ))
            .into());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(ChatsumError::Provider(format!(
                "Gemini returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ChatsumError::Provider(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        let message = Message::assistant(text);
        Ok(match body.usage_metadata {
            Some(usage) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(usage.prompt_token_count, usage.candidates_token_count),
            ),
            None => CompletionResponse::new(message),
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> GeminiConfig {
        GeminiConfig {
            api_base: server.uri(),
            model: "gemini-2.0-flash".to_string(),
            api_key: Some("test-key".to_string()),
            temperature: 0.7,
        }
    }

    #[test]
    fn test_missing_key_is_missing_credentials() {
        let config = GeminiConfig::default();
        let err = GeminiProvider::new(config, 5).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ChatsumError>(),
            Some(ChatsumError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_build_request_splits_system_instruction() {
        let config = GeminiConfig {
            api_key: Some("k".to_string()),
            ..GeminiConfig::default()
        };
        let provider = GeminiProvider::new(config, 5).unwrap();
        let request = provider.build_request(&[
            Message::system("be brief"),
            Message::user("transcript"),
            Message::assistant("earlier answer"),
        ]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_complete_joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "summarize"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Overview: "}, {"text": "all good."}]}
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(config_for(&server), 5).unwrap();
        let response = provider
            .complete(&[Message::user("summarize")])
            .await
            .unwrap();

        assert_eq!(response.text(), Some("Overview: all good."));
        assert_eq!(response.usage, Some(TokenUsage::new(12, 4)));
    }

    #[tokio::test]
    async fn test_complete_without_candidates_yields_no_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(config_for(&server), 5).unwrap();
        let response = provider.complete(&[Message::user("x")]).await.unwrap();
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_forbidden_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key invalid"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(config_for(&server), 5).unwrap();
        let err = provider.complete(&[Message::user("x")]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatsumError>(),
            Some(ChatsumError::Authentication(_))
        ));
    }
}
