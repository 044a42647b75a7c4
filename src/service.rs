//! Credentialed entry points
//!
//! `ChatService` is the one surface the HTTP layer talks to. Each call
//! resolves its bearer credential through the [`IdentityResolver`] and reads
//! the clock itself; no caller state survives between calls.

use crate::accounts::{Registration, UserDirectory};
use crate::chat::{ChatRegistry, ChatView, ExitOutcome, NewChat, ParticipantStore};
use crate::config::{Config, SummarizerConfig};
use crate::error::Result;
use crate::identity::{Identity, IdentityResolver, TokenResolver};
use crate::messages::{Message, MessageLog};
use crate::providers::{create_provider, Provider};
use crate::storage::{blocking, SqliteStore, User};
use crate::summarizer::{Summarizer, SummaryOutcome};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Chat, message and summary operations for authenticated callers
pub struct ChatService {
    identity: Arc<dyn IdentityResolver>,
    users: UserDirectory,
    registry: ChatRegistry,
    log: Arc<MessageLog>,
    summarizer: Summarizer,
}

impl ChatService {
    /// Wire the components over an opened store and message log
    pub fn new(
        store: SqliteStore,
        log: Arc<MessageLog>,
        provider: Arc<dyn Provider>,
        summarizer: SummarizerConfig,
    ) -> Self {
        let tokens = TokenResolver::new(store.clone());
        let participants = ParticipantStore::new(store.clone());
        Self {
            identity: Arc::new(tokens.clone()),
            users: UserDirectory::new(store.clone(), tokens),
            registry: ChatRegistry::new(store.clone(), participants),
            summarizer: Summarizer::new(Arc::clone(&log), store, provider, summarizer),
            log,
        }
    }

    /// Open storage and the provider named in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = match &config.storage.database_path {
            Some(path) => SqliteStore::new_with_path(path.clone())?,
            None => SqliteStore::new()?,
        };
        let log_path = config.storage.resolved_message_log_path()?;
        let log = MessageLog::new(&log_path, store.clone(), ParticipantStore::new(store.clone()))?;
        let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.provider)?);

        tracing::info!(
            database = %store.path().display(),
            message_log = %log_path.display(),
            provider = provider.name(),
            "Service initialized"
        );
        Ok(Self::new(
            store,
            Arc::new(log),
            provider,
            config.summarizer.clone(),
        ))
    }

    /// Replace the token resolver, e.g. with one backed by an external issuer
    pub fn with_identity_resolver(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = identity;
        self
    }

    async fn authenticate(&self, credential: &str) -> Result<Identity> {
        let identity = self.identity.resolve(credential).await?;
        debug!(user_id = %identity.user_id, "Resolved caller");
        Ok(identity)
    }

    /// Register a new account; the only call without a credential
    pub async fn signup(&self, username: &str, email: &str) -> Result<Registration> {
        let users = self.users.clone();
        let (username, email) = (username.to_string(), email.to_string());
        blocking(move || users.register(&username, &email, Utc::now())).await
    }

    pub async fn current_user(&self, credential: &str) -> Result<User> {
        let caller = self.authenticate(credential).await?;
        let users = self.users.clone();
        blocking(move || users.get(&caller.user_id)).await
    }

    pub async fn search_users(&self, credential: &str, query: &str) -> Result<Vec<User>> {
        let caller = self.authenticate(credential).await?;
        let users = self.users.clone();
        let query = query.to_string();
        blocking(move || users.search(&caller.user_id, &query)).await
    }

    pub async fn get_user(&self, credential: &str, user_id: &str) -> Result<User> {
        self.authenticate(credential).await?;
        let users = self.users.clone();
        let user_id = user_id.to_string();
        blocking(move || users.get(&user_id)).await
    }

    pub async fn create_chat(&self, credential: &str, request: NewChat) -> Result<ChatView> {
        let caller = self.authenticate(credential).await?;
        let registry = self.registry.clone();
        blocking(move || registry.create(request, &caller.user_id, Utc::now())).await
    }

    /// Chats the caller belongs to, newest first, with live status
    pub async fn list_my_chats(&self, credential: &str) -> Result<Vec<ChatView>> {
        let caller = self.authenticate(credential).await?;
        let registry = self.registry.clone();
        blocking(move || registry.list_for_user(&caller.user_id, Utc::now())).await
    }

    pub async fn get_chat(&self, credential: &str, chat_id: &str) -> Result<ChatView> {
        let caller = self.authenticate(credential).await?;
        let registry = self.registry.clone();
        let chat_id = chat_id.to_string();
        blocking(move || registry.get(&chat_id, &caller.user_id, Utc::now())).await
    }

    pub async fn participants(&self, credential: &str, chat_id: &str) -> Result<Vec<String>> {
        let caller = self.authenticate(credential).await?;
        let participants = self.registry.participants().clone();
        let chat_id = chat_id.to_string();
        blocking(move || participants.list_usernames(&chat_id, &caller.user_id)).await
    }

    /// Add a member by username; returns the new member's id
    pub async fn add_participant(
        &self,
        credential: &str,
        chat_id: &str,
        username: &str,
    ) -> Result<String> {
        let caller = self.authenticate(credential).await?;
        let participants = self.registry.participants().clone();
        let (chat_id, username) = (chat_id.to_string(), username.to_string());
        blocking(move || {
            participants.add_by_username(&chat_id, &caller.user_id, &username, Utc::now())
        })
        .await
    }

    pub async fn remove_participant(
        &self,
        credential: &str,
        chat_id: &str,
        user_id: &str,
    ) -> Result<()> {
        let caller = self.authenticate(credential).await?;
        let participants = self.registry.participants().clone();
        let (chat_id, user_id) = (chat_id.to_string(), user_id.to_string());
        blocking(move || participants.remove(&chat_id, &caller.user_id, &user_id)).await
    }

    pub async fn exit_chat(&self, credential: &str, chat_id: &str) -> Result<ExitOutcome> {
        let caller = self.authenticate(credential).await?;
        let registry = self.registry.clone();
        let chat_id = chat_id.to_string();
        blocking(move || registry.exit(&chat_id, &caller.user_id, Utc::now())).await
    }

    pub async fn delete_chat(&self, credential: &str, chat_id: &str) -> Result<()> {
        let caller = self.authenticate(credential).await?;
        let registry = self.registry.clone();
        let chat_id = chat_id.to_string();
        blocking(move || registry.delete(&chat_id, &caller.user_id, Utc::now())).await
    }

    pub async fn send_message(
        &self,
        credential: &str,
        chat_id: &str,
        content: &str,
    ) -> Result<Message> {
        let caller = self.authenticate(credential).await?;
        let log = Arc::clone(&self.log);
        let (chat_id, content) = (chat_id.to_string(), content.to_string());
        blocking(move || log.append(&chat_id, &caller.user_id, &content, Utc::now())).await
    }

    /// Chronological messages, optionally only those after sequence `after`
    pub async fn list_messages(
        &self,
        credential: &str,
        chat_id: &str,
        after: Option<u64>,
    ) -> Result<Vec<Message>> {
        let caller = self.authenticate(credential).await?;
        let log = Arc::clone(&self.log);
        let chat_id = chat_id.to_string();
        blocking(move || match after {
            Some(after) => log.list_since(&chat_id, &caller.user_id, after),
            None => log.list_all(&chat_id, &caller.user_id),
        })
        .await
    }

    pub async fn get_summary(&self, credential: &str, chat_id: &str) -> Result<SummaryOutcome> {
        let caller = self.authenticate(credential).await?;
        self.summarizer.summarize(chat_id, &caller.user_id).await
    }

    /// Flush the message log; called once the server has stopped
    pub async fn shutdown(&self) -> Result<()> {
        self.log.flush().await
    }
}
