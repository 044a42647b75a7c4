//! On-demand chat summaries
//!
//! A summary request reads a snapshot of the chat's latest messages, renders
//! them into a prompt and asks the configured provider for a digest. No lock
//! on the message log or the relational store is held while the provider
//! call is in flight.
//!
//! Every provider call is bounded by `summarizer.timeout_seconds`. A timeout,
//! transport error or empty response is retried once; credential failures
//! are not. When the attempts are exhausted the caller gets
//! `SummarizationUnavailable`, never an empty digest.

pub mod metrics;
pub mod prompt;

use crate::config::{SummarizerConfig, MAX_SUMMARY_RETRIES};
use crate::error::{ChatsumError, Result};
use crate::messages::MessageLog;
use crate::providers::{Message as LlmMessage, Provider};
use crate::storage::{blocking, SqliteStore};
use self::metrics::SummaryMetrics;
use serde::{Deserialize, Serialize};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a summary request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// The chat has no messages yet
    NothingToSummarize,
    /// A digest of the latest messages
    Digest {
        text: String,
        /// Messages that went into the digest
        message_count: usize,
        /// Sequence of the newest summarized message
        through_sequence: u64,
        /// Window size requested
        window_size: usize,
        /// Served from cache without calling the provider
        cached: bool,
    },
}

#[derive(Debug, Clone)]
struct CachedDigest {
    through_sequence: u64,
    message_count: usize,
    text: String,
}

/// Produces digests of a chat's recent messages
pub struct Summarizer {
    log: Arc<MessageLog>,
    store: SqliteStore,
    provider: Arc<dyn Provider>,
    config: SummarizerConfig,
    cache: Mutex<LruCache<(String, usize), CachedDigest>>,
}

impl Summarizer {
    pub fn new(
        log: Arc<MessageLog>,
        store: SqliteStore,
        provider: Arc<dyn Provider>,
        config: SummarizerConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            log,
            store,
            provider,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Summarize the latest `summarizer.window_size` messages
    pub async fn summarize(&self, chat_id: &str, caller_id: &str) -> Result<SummaryOutcome> {
        self.summarize_window(chat_id, caller_id, self.config.window_size)
            .await
    }

    /// Summarize the latest `window` messages of a chat
    ///
    /// # Errors
    ///
    /// `NotFound` / `NotMember` for access failures, `InvalidRequest` for a
    /// zero window, `SummarizationUnavailable` when the provider fails after
    /// the allowed retry.
    pub async fn summarize_window(
        &self,
        chat_id: &str,
        caller_id: &str,
        window: usize,
    ) -> Result<SummaryOutcome> {
        if window == 0 {
            return Err(ChatsumError::InvalidRequest("window size must be positive".into()).into());
        }

        let metrics = SummaryMetrics::new(self.provider.name());
        let (chat, head) = {
            let log = Arc::clone(&self.log);
            let store = self.store.clone();
            let (chat_id, caller_id) = (chat_id.to_string(), caller_id.to_string());
            blocking(move || {
                log.ensure_reader(&chat_id, &caller_id)?;
                let chat = store
                    .get_chat(&chat_id)?
                    .ok_or_else(|| ChatsumError::not_found("Chat", chat_id.as_str()))?;
                let head = log.message_count(&chat_id)?;
                Ok((chat, head))
            })
            .await?
        };
        if head == 0 {
            metrics.record_outcome("empty");
            return Ok(SummaryOutcome::NothingToSummarize);
        }

        let key = (chat_id.to_string(), window);
        if let Some(hit) = self.cached(&key, head) {
            debug!(chat_id, through = hit.through_sequence, "Serving cached summary");
            metrics.record_outcome("cached");
            return Ok(SummaryOutcome::Digest {
                text: hit.text,
                message_count: hit.message_count,
                through_sequence: hit.through_sequence,
                window_size: window,
                cached: true,
            });
        }

        let messages = {
            let log = Arc::clone(&self.log);
            let (chat_id, caller_id) = (chat_id.to_string(), caller_id.to_string());
            blocking(move || log.list_latest(&chat_id, &caller_id, window)).await?
        };
        let Some(last) = messages.last() else {
            metrics.record_outcome("empty");
            return Ok(SummaryOutcome::NothingToSummarize);
        };
        let through_sequence = last.sequence;

        let conversation = prompt::build_prompt(&chat, &messages);
        debug!(
            chat_id,
            messages = messages.len(),
            provider = self.provider.name(),
            "Requesting summary"
        );

        let text = match self.call_llm(&conversation, &metrics).await {
            Ok(text) => text,
            Err(e) => {
                metrics.record_outcome("unavailable");
                return Err(e);
            }
        };

        if self.config.cache_enabled {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(
                    key,
                    CachedDigest {
                        through_sequence,
                        message_count: messages.len(),
                        text: text.clone(),
                    },
                );
            }
        }

        metrics.record_outcome("digest");
        info!(
            chat_id,
            messages = messages.len(),
            elapsed_ms = metrics.elapsed().as_millis() as u64,
            "Summary generated"
        );

        Ok(SummaryOutcome::Digest {
            text,
            message_count: messages.len(),
            through_sequence,
            window_size: window,
            cached: false,
        })
    }

    fn cached(&self, key: &(String, usize), head: u64) -> Option<CachedDigest> {
        if !self.config.cache_enabled {
            return None;
        }
        let mut cache = self.cache.lock().ok()?;
        let hit = cache
            .get(key)
            .filter(|entry| entry.through_sequence == head)
            .cloned();
        if hit.is_none() {
            cache.pop(key);
        }
        hit
    }

    async fn call_llm(&self, conversation: &[LlmMessage], metrics: &SummaryMetrics) -> Result<String> {
        let max_attempts = 1 + self.config.max_retries.min(MAX_SUMMARY_RETRIES);
        let limit = Duration::from_secs(self.config.timeout_seconds);
        let mut reason = String::new();

        for attempt in 1..=max_attempts {
            match tokio::time::timeout(limit, self.provider.complete(conversation)).await {
                Ok(Ok(response)) => match response.text() {
                    Some(text) => {
                        metrics.record_attempt("ok");
                        return Ok(text.to_string());
                    }
                    None => {
                        metrics.record_attempt("empty");
                        reason = "provider returned an empty summary".to_string();
                    }
                },
                Ok(Err(e)) => {
                    metrics.record_attempt("error");
                    if is_permanent(&e) {
                        return Err(ChatsumError::SummarizationUnavailable {
                            attempts: attempt,
                            reason: e.to_string(),
                        }
                        .into());
                    }
                    reason = e.to_string();
                }
                Err(_) => {
                    metrics.record_attempt("timeout");
                    reason = format!("provider timed out after {}s", limit.as_secs());
                }
            }

            if attempt < max_attempts {
                warn!(attempt, reason = %reason, "Summary attempt failed, retrying");
            }
        }

        warn!(attempts = max_attempts, reason = %reason, "Summarization unavailable");
        Err(ChatsumError::SummarizationUnavailable {
            attempts: max_attempts,
            reason,
        }
        .into())
    }
}

/// Failures a second attempt cannot fix
fn is_permanent(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ChatsumError>(),
        Some(ChatsumError::Authentication(_)) | Some(ChatsumError::MissingCredentials(_))
    )
}
