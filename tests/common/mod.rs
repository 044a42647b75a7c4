use async_trait::async_trait;
use chatsum::accounts::Registration;
use chatsum::chat::ParticipantStore;
use chatsum::config::SummarizerConfig;
use chatsum::messages::MessageLog;
use chatsum::providers::{CompletionResponse, Message, Provider};
use chatsum::storage::{SqliteStore, User};
use chatsum::{ChatService, ChatsumError};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One scripted provider reply
#[allow(dead_code)]
pub enum Reply {
    Text(&'static str),
    Fail(&'static str),
}

/// Provider that plays back canned replies and records every prompt
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<Vec<Message>>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User-turn text of the most recent prompt
    pub fn last_prompt(&self) -> String {
        let prompts = self.prompts.lock().unwrap();
        prompts
            .last()
            .and_then(|p| p.iter().rev().find(|m| m.role == "user"))
            .and_then(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, messages: &[Message]) -> chatsum::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(messages.to_vec());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(CompletionResponse::new(Message::assistant(text))),
            Some(Reply::Fail(reason)) => Err(ChatsumError::Provider(reason.to_string()).into()),
            None => Err(ChatsumError::Provider("script exhausted".to_string()).into()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Store and on-disk message log under one temporary directory
#[allow(dead_code)]
pub fn create_stores() -> (SqliteStore, MessageLog, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SqliteStore::new_with_path(tmp.path().join("chatsum.db"))
        .expect("failed to create sqlite store");
    let log = MessageLog::new(
        tmp.path().join("messages"),
        store.clone(),
        ParticipantStore::new(store.clone()),
    )
    .expect("failed to open message log");
    (store, log, tmp)
}

/// A fully wired service over temporary storage
#[allow(dead_code)]
pub fn create_service(provider: Arc<dyn Provider>) -> (ChatService, TempDir) {
    let (store, log, tmp) = create_stores();
    let service = ChatService::new(store, Arc::new(log), provider, SummarizerConfig::default());
    (service, tmp)
}

#[allow(dead_code)]
pub async fn signup(service: &ChatService, username: &str) -> Registration {
    service
        .signup(username, &format!("{}@example.com", username))
        .await
        .expect("signup failed")
}

#[allow(dead_code)]
pub fn insert_user(store: &SqliteStore, username: &str) -> User {
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        created_at: chrono::Utc::now(),
    };
    store.insert_user(&user).expect("failed to insert user");
    user
}

/// Kind of the `ChatsumError` inside an error, or `"other"`
#[allow(dead_code)]
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<ChatsumError>()
        .map(|e| e.kind())
        .unwrap_or("other")
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
