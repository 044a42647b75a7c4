//! Error types for chatsum
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Domain variants (`NotAuthorized` through `SummarizationUnavailable`) are
//! caller-facing: they describe a request that cannot succeed as issued and
//! are reported without retry. The remaining variants wrap infrastructure
//! failures (storage, providers, configuration).

use crate::chat::ChatStatus;
use thiserror::Error;

/// Main error type for chatsum operations
#[derive(Error, Debug)]
pub enum ChatsumError {
    /// Caller lacks the role required for the operation (e.g. not the creator)
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Caller is not a participant of the chat
    #[error("Not a participant of chat {chat_id}")]
    NotMember {
        /// Chat the caller tried to access
        chat_id: String,
    },

    /// Chat, user or message does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Bad start/end time combination
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Membership change attempted on a completed chat
    #[error("Chat {0} is closed")]
    ChatClosed(String),

    /// Message sent to a chat that is not currently active
    #[error("Chat {chat_id} is not active (status: {status})")]
    ChatNotActive {
        /// Chat the message was sent to
        chat_id: String,
        /// Derived status at the time of the attempt
        status: ChatStatus,
    },

    /// Exit or delete attempted on a completed chat
    #[error("Chat {0} is already closed")]
    AlreadyClosed(String),

    /// User is already a participant
    #[error("User {user_id} is already a participant of chat {chat_id}")]
    AlreadyMember {
        /// Chat being modified
        chat_id: String,
        /// User that was being added
        user_id: String,
    },

    /// The creator can only leave through exit or delete
    #[error("The creator cannot be removed from chat {0}")]
    CannotRemoveCreator(String),

    /// The LLM call failed after the allowed retry
    #[error("Summarization unavailable after {attempts} attempt(s): {reason}")]
    SummarizationUnavailable {
        /// Number of LLM attempts made
        attempts: u32,
        /// Last failure reason
        reason: String,
    },

    /// Credential missing, malformed or unknown
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Request payload failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unique value already taken (username, email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Provider rejected our credentials (401/403)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Relational store or message log failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ChatsumError {
    /// Shorthand for a missing entity
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a missing membership
    pub fn not_member(chat_id: impl Into<String>) -> Self {
        Self::NotMember {
            chat_id: chat_id.into(),
        }
    }

    /// Stable machine-readable name, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthorized(_) => "not_authorized",
            Self::NotMember { .. } => "not_member",
            Self::NotFound { .. } => "not_found",
            Self::InvalidSchedule(_) => "invalid_schedule",
            Self::ChatClosed(_) => "chat_closed",
            Self::ChatNotActive { .. } => "chat_not_active",
            Self::AlreadyClosed(_) => "already_closed",
            Self::AlreadyMember { .. } => "already_member",
            Self::CannotRemoveCreator(_) => "cannot_remove_creator",
            Self::SummarizationUnavailable { .. } => "summarization_unavailable",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Conflict(_) => "conflict",
            Self::Config(_) => "config",
            Self::Provider(_) => "provider",
            Self::MissingCredentials(_) => "missing_credentials",
            Self::Authentication(_) => "authentication",
            Self::Storage(_) => "storage",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Yaml(_) => "yaml",
            Self::Http(_) => "http",
        }
    }

    /// Whether the error describes the caller's request rather than an
    /// infrastructure failure
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Self::NotAuthorized(_)
                | Self::NotMember { .. }
                | Self::NotFound { .. }
                | Self::InvalidSchedule(_)
                | Self::ChatClosed(_)
                | Self::ChatNotActive { .. }
                | Self::AlreadyClosed(_)
                | Self::AlreadyMember { .. }
                | Self::CannotRemoveCreator(_)
                | Self::SummarizationUnavailable { .. }
                | Self::Unauthenticated(_)
                | Self::InvalidRequest(_)
                | Self::Conflict(_)
        )
    }
}

/// Result type alias for chatsum operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Domain errors
/// are recovered with `downcast_ref::<ChatsumError>()`.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = ChatsumError::not_found("Chat", "abc");
        assert_eq!(error.to_string(), "Chat not found: abc");
    }

    #[test]
    fn test_chat_not_active_display_includes_status() {
        let error = ChatsumError::ChatNotActive {
            chat_id: "c1".to_string(),
            status: ChatStatus::Scheduled,
        };
        assert_eq!(
            error.to_string(),
            "Chat c1 is not active (status: scheduled)"
        );
    }

    #[test]
    fn test_summarization_unavailable_display() {
        let error = ChatsumError::SummarizationUnavailable {
            attempts: 2,
            reason: "timed out".to_string(),
        };
        let s = error.to_string();
        assert!(s.contains("2 attempt(s)"));
        assert!(s.contains("timed out"));
    }

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(ChatsumError::not_member("c").kind(), "not_member");
        assert_eq!(
            ChatsumError::CannotRemoveCreator("c".into()).kind(),
            "cannot_remove_creator"
        );
        assert_eq!(ChatsumError::Storage("x".into()).kind(), "storage");
    }

    #[test]
    fn test_caller_facing_split() {
        assert!(ChatsumError::AlreadyClosed("c".into()).is_caller_facing());
        assert!(ChatsumError::SummarizationUnavailable {
            attempts: 2,
            reason: String::new()
        }
        .is_caller_facing());
        assert!(!ChatsumError::Storage("disk full".into()).is_caller_facing());
        assert!(!ChatsumError::Provider("boom".into()).is_caller_facing());
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = ChatsumError::InvalidSchedule("end in past".into()).into();
        assert!(matches!(
            err.downcast_ref::<ChatsumError>(),
            Some(ChatsumError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ChatsumError = io_error.into();
        assert!(matches!(error, ChatsumError::Io(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: ChatsumError = yaml_error.into();
        assert!(matches!(error, ChatsumError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatsumError>();
    }
}
