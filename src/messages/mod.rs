//! Append-only per-chat message log
//!
//! Messages live in an embedded `sled` database. Each chat has a small head
//! record (last sequence and last timestamp) in a separate tree; an append
//! reads and advances the head and writes the message in one sled
//! transaction, so concurrent writers to the same chat always observe a
//! strictly increasing sequence and a non-decreasing timestamp.
//!
//! Keys are `chat_id ++ 0x00 ++ sequence (big endian)`, which keeps one
//! chat's messages contiguous and in append order for prefix scans.

use crate::chat::{ChatStatus, ParticipantStore};
use crate::error::{ChatsumError, Result};
use crate::storage::SqliteStore;
use chrono::{DateTime, Utc};
use metrics::increment_counter;
use serde::{Deserialize, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{Db, Transactional, Tree};
use std::path::Path;
use tracing::debug;
use ulid::Ulid;

/// Maximum message length, in characters
pub const MAX_CONTENT_LEN: usize = 1000;

const KEY_SEPARATOR: u8 = 0x00;

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (ULID)
    pub id: String,
    pub chat_id: String,
    /// Position in the chat's log, starting at 1
    pub sequence: u64,
    pub sender_id: String,
    /// Sender's username at the time of writing
    pub sender_username: String,
    pub content: String,
    /// Server-assigned; never earlier than the previous message's
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct LogHead {
    sequence: u64,
    last_timestamp: DateTime<Utc>,
}

fn chat_prefix(chat_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(chat_id.len() + 1);
    prefix.extend_from_slice(chat_id.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}

fn message_key(chat_id: &str, sequence: u64) -> Vec<u8> {
    let mut key = chat_prefix(chat_id);
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

fn decode(bytes: &[u8]) -> Result<Message> {
    serde_json::from_slice(bytes)
        .map_err(|e| ChatsumError::Storage(format!("Deserialization failed: {}", e)).into())
}

fn collect<I>(iter: I) -> Result<Vec<Message>>
where
    I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
{
    iter.map(|entry| {
        let (_, value) =
            entry.map_err(|e| ChatsumError::Storage(format!("Iteration failed: {}", e)))?;
        decode(&value)
    })
    .collect()
}

/// Message persistence plus the access rules around it
pub struct MessageLog {
    db: Db,
    heads: Tree,
    messages: Tree,
    store: SqliteStore,
    participants: ParticipantStore,
}

impl MessageLog {
    /// Open or create the log at `path`
    ///
    /// # Errors
    ///
    /// Returns `ChatsumError::Storage` if the database cannot be opened
    pub fn new(path: impl AsRef<Path>, store: SqliteStore, participants: ParticipantStore) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| ChatsumError::Storage(format!("Failed to open message log: {}", e)))?;
        Self::from_db(db, store, participants)
    }

    /// In-memory log that is discarded on drop
    pub fn temporary(store: SqliteStore, participants: ParticipantStore) -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| ChatsumError::Storage(format!("Failed to open message log: {}", e)))?;
        Self::from_db(db, store, participants)
    }

    fn from_db(db: Db, store: SqliteStore, participants: ParticipantStore) -> Result<Self> {
        let heads = db
            .open_tree("heads")
            .map_err(|e| ChatsumError::Storage(format!("Failed to open tree: {}", e)))?;
        let messages = db
            .open_tree("messages")
            .map_err(|e| ChatsumError::Storage(format!("Failed to open tree: {}", e)))?;
        Ok(Self {
            db,
            heads,
            messages,
            store,
            participants,
        })
    }

    /// Append a message from `sender_id`
    ///
    /// The chat must be active at `now` and the sender a participant. The
    /// returned message carries the sequence and timestamp the log assigned.
    pub fn append(&self, chat_id: &str, sender_id: &str, content: &str, now: DateTime<Utc>) -> Result<Message> {
        let chat = self
            .store
            .get_chat(chat_id)?
            .ok_or_else(|| ChatsumError::not_found("Chat", chat_id))?;

        let status = chat.status_at(now);
        if status != ChatStatus::Active {
            return Err(ChatsumError::ChatNotActive {
                chat_id: chat_id.to_string(),
                status,
            }
            .into());
        }

        if !self.participants.is_member(chat_id, sender_id)? {
            return Err(ChatsumError::not_member(chat_id).into());
        }

        let length = content.chars().count();
        if content.trim().is_empty() || length > MAX_CONTENT_LEN {
            return Err(ChatsumError::InvalidRequest(format!(
                "message content must be between 1 and {} characters",
                MAX_CONTENT_LEN
            ))
            .into());
        }

        let sender = self
            .store
            .get_user(sender_id)?
            .ok_or_else(|| ChatsumError::not_found("User", sender_id))?;

        let result = (&self.heads, &self.messages).transaction(
            |(heads, messages)| -> ConflictableTransactionResult<Message, serde_json::Error> {
                let head = match heads.get(chat_id.as_bytes())? {
                    Some(bytes) => Some(
                        serde_json::from_slice::<LogHead>(&bytes)
                            .map_err(ConflictableTransactionError::Abort)?,
                    ),
                    None => None,
                };

                let (sequence, timestamp) = match head {
                    Some(h) => (h.sequence + 1, now.max(h.last_timestamp)),
                    None => (1, now),
                };

                let message = Message {
                    id: Ulid::new().to_string(),
                    chat_id: chat_id.to_string(),
                    sequence,
                    sender_id: sender.id.clone(),
                    sender_username: sender.username.clone(),
                    content: content.to_string(),
                    timestamp,
                };

                let next_head = LogHead {
                    sequence,
                    last_timestamp: timestamp,
                };
                let head_bytes =
                    serde_json::to_vec(&next_head).map_err(ConflictableTransactionError::Abort)?;
                let message_bytes =
                    serde_json::to_vec(&message).map_err(ConflictableTransactionError::Abort)?;

                heads.insert(chat_id.as_bytes(), head_bytes)?;
                messages.insert(message_key(chat_id, sequence), message_bytes)?;
                Ok(message)
            },
        );

        let message = result.map_err(|e| match e {
            TransactionError::Abort(e) => ChatsumError::Storage(format!("Serialization failed: {}", e)),
            TransactionError::Storage(e) => ChatsumError::Storage(format!("Append failed: {}", e)),
        })?;

        increment_counter!("messages_appended_total");
        debug!(chat_id, sequence = message.sequence, "Message appended");
        Ok(message)
    }

    /// Write buffered appends to disk
    ///
    /// sled already flushes on its own interval; this is for shutdown.
    pub async fn flush(&self) -> Result<()> {
        let bytes = self
            .db
            .flush_async()
            .await
            .map_err(|e| ChatsumError::Storage(format!("Flush failed: {}", e)))?;
        debug!(bytes, "Message log flushed");
        Ok(())
    }

    /// `NotFound` if the chat is absent, `NotMember` if the caller cannot read it
    pub fn ensure_reader(&self, chat_id: &str, caller_id: &str) -> Result<()> {
        if self.store.get_chat(chat_id)?.is_none() {
            return Err(ChatsumError::not_found("Chat", chat_id).into());
        }
        if !self.participants.is_member(chat_id, caller_id)? {
            return Err(ChatsumError::not_member(chat_id).into());
        }
        Ok(())
    }

    /// The latest `n` messages, oldest first
    pub fn list_latest(&self, chat_id: &str, caller_id: &str, n: usize) -> Result<Vec<Message>> {
        self.ensure_reader(chat_id, caller_id)?;
        let mut latest = collect(self.messages.scan_prefix(chat_prefix(chat_id)).rev().take(n))?;
        latest.reverse();
        Ok(latest)
    }

    /// Every message of a chat, oldest first
    pub fn list_all(&self, chat_id: &str, caller_id: &str) -> Result<Vec<Message>> {
        self.ensure_reader(chat_id, caller_id)?;
        collect(self.messages.scan_prefix(chat_prefix(chat_id)))
    }

    /// Messages with a sequence greater than `after`, oldest first
    ///
    /// Polling clients pass the last sequence they have seen.
    pub fn list_since(&self, chat_id: &str, caller_id: &str, after: u64) -> Result<Vec<Message>> {
        self.ensure_reader(chat_id, caller_id)?;
        let Some(first) = after.checked_add(1) else {
            return Ok(Vec::new());
        };
        let start = message_key(chat_id, first);
        let mut end = chat_id.as_bytes().to_vec();
        end.push(KEY_SEPARATOR + 1);
        collect(self.messages.range(start..end))
    }

    /// Number of messages ever appended to a chat
    pub fn message_count(&self, chat_id: &str) -> Result<u64> {
        let head = self
            .heads
            .get(chat_id.as_bytes())
            .map_err(|e| ChatsumError::Storage(format!("Get failed: {}", e)))?;
        match head {
            Some(bytes) => {
                let head: LogHead = serde_json::from_slice(&bytes)
                    .map_err(|e| ChatsumError::Storage(format!("Deserialization failed: {}", e)))?;
                Ok(head.sequence)
            }
            None => Ok(0),
        }
    }
}
