//! Chat creation and creator-driven lifecycle transitions

use super::{
    validate_schedule, Chat, ChatStatus, ChatView, ClosedReason, NewChat, ParticipantStore,
    MAX_NAME_LEN,
};
use crate::error::{ChatsumError, Result};
use crate::storage::SqliteStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What an exit did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitOutcome {
    /// A non-creator left; the chat carries on
    Left,
    /// The creator left and the chat is now completed for everyone
    Closed,
}

/// Owns chat records and the transitions only the creator can trigger
#[derive(Debug, Clone)]
pub struct ChatRegistry {
    store: SqliteStore,
    participants: ParticipantStore,
}

impl ChatRegistry {
    pub fn new(store: SqliteStore, participants: ParticipantStore) -> Self {
        Self {
            store,
            participants,
        }
    }

    /// Membership component shared with this registry
    pub fn participants(&self) -> &ParticipantStore {
        &self.participants
    }

    fn load(&self, chat_id: &str) -> Result<Chat> {
        self.store
            .get_chat(chat_id)?
            .ok_or_else(|| ChatsumError::not_found("Chat", chat_id).into())
    }

    fn view(&self, chat: &Chat, now: DateTime<Utc>) -> Result<ChatView> {
        let creator_username = self
            .store
            .get_user(&chat.creator_id)?
            .map(|u| u.username)
            .unwrap_or_default();
        let count = self.participants.count(&chat.id)?;
        Ok(ChatView::new(chat, creator_username, count, now))
    }

    /// Create a chat with the caller as creator and first participant
    ///
    /// Invitees are best-effort: ids and emails that do not resolve to a
    /// known user are skipped.
    pub fn create(&self, request: NewChat, creator_id: &str, now: DateTime<Utc>) -> Result<ChatView> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ChatsumError::InvalidRequest("chat name must not be empty".into()).into());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ChatsumError::InvalidRequest(format!(
                "chat name must be at most {} characters",
                MAX_NAME_LEN
            ))
            .into());
        }

        validate_schedule(request.start_time, request.end_time, now)?;

        let creator = self
            .store
            .get_user(creator_id)?
            .ok_or_else(|| ChatsumError::not_found("User", creator_id))?;

        let mut members = vec![creator.id.clone()];
        for id in &request.invited_ids {
            match self.store.get_user(id)? {
                Some(user) if !members.contains(&user.id) => members.push(user.id),
                Some(_) => {}
                None => warn!(invitee = %id, "Skipping unknown invitee"),
            }
        }
        for email in &request.invited_emails {
            match self.store.find_user_by_email(email.trim())? {
                Some(user) if !members.contains(&user.id) => members.push(user.id),
                Some(_) => {}
                None => warn!(invitee = %email, "Skipping unknown invitee"),
            }
        }

        let chat = Chat {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            creator_id: creator.id.clone(),
            created_at: now,
            start_time: request.start_time,
            end_time: request.end_time,
            closed_at: None,
            closed_reason: None,
        };

        self.store.insert_chat(&chat, &members)?;

        let view = ChatView::new(&chat, creator.username, members.len(), now);
        info!(
            chat_id = %chat.id,
            creator = %chat.creator_id,
            participants = members.len(),
            status = %view.status,
            "Chat created"
        );
        Ok(view)
    }

    /// Derived status of a chat at `now`
    pub fn status(&self, chat_id: &str, now: DateTime<Utc>) -> Result<ChatStatus> {
        Ok(self.load(chat_id)?.status_at(now))
    }

    /// Leave a chat
    ///
    /// A member simply leaves. The creator leaving is a separate transition:
    /// it sets the terminal marker and ends the chat for everyone, while the
    /// creator's membership is kept.
    pub fn exit(&self, chat_id: &str, caller_id: &str, now: DateTime<Utc>) -> Result<ExitOutcome> {
        let chat = self.load(chat_id)?;

        if !self.participants.is_member(chat_id, caller_id)? {
            return Err(ChatsumError::not_member(chat_id).into());
        }

        if chat.status_at(now) == ChatStatus::Completed {
            return Err(ChatsumError::AlreadyClosed(chat_id.to_string()).into());
        }

        if chat.is_creator(caller_id) {
            self.close(&chat, ClosedReason::Exited, now)?;
            return Ok(ExitOutcome::Closed);
        }

        if !self.participants.leave(chat_id, caller_id)? {
            return Err(ChatsumError::not_member(chat_id).into());
        }
        info!(chat_id, user_id = caller_id, "Participant left chat");
        Ok(ExitOutcome::Left)
    }

    /// End a chat for everyone; creator only
    pub fn delete(&self, chat_id: &str, caller_id: &str, now: DateTime<Utc>) -> Result<()> {
        let chat = self.load(chat_id)?;

        if !chat.is_creator(caller_id) {
            return Err(ChatsumError::NotAuthorized(
                "only the chat creator can delete the chat".to_string(),
            )
            .into());
        }

        if chat.status_at(now) == ChatStatus::Completed {
            return Err(ChatsumError::AlreadyClosed(chat_id.to_string()).into());
        }

        self.close(&chat, ClosedReason::Deleted, now)
    }

    fn close(&self, chat: &Chat, reason: ClosedReason, now: DateTime<Utc>) -> Result<()> {
        // A concurrent exit/delete may have won the update.
        if !self.store.mark_chat_closed(&chat.id, reason, now)? {
            return Err(ChatsumError::AlreadyClosed(chat.id.clone()).into());
        }
        info!(chat_id = %chat.id, reason = reason.as_str(), "Chat closed by creator");
        Ok(())
    }

    /// A single chat, visible to its members
    pub fn get(&self, chat_id: &str, caller_id: &str, now: DateTime<Utc>) -> Result<ChatView> {
        let chat = self.load(chat_id)?;
        if !self.participants.is_member(chat_id, caller_id)? {
            return Err(ChatsumError::not_member(chat_id).into());
        }
        self.view(&chat, now)
    }

    /// Every chat the user currently belongs to, newest first
    pub fn list_for_user(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<ChatView>> {
        let chats = self.store.chats_for_user(user_id)?;
        debug!(user_id, count = chats.len(), "Listing chats");

        let mut usernames: HashMap<String, String> = HashMap::new();
        let mut views = Vec::with_capacity(chats.len());
        for chat in &chats {
            let creator_username = match usernames.get(&chat.creator_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .store
                        .get_user(&chat.creator_id)?
                        .map(|u| u.username)
                        .unwrap_or_default();
                    usernames.insert(chat.creator_id.clone(), name.clone());
                    name
                }
            };
            let count = self.participants.count(&chat.id)?;
            views.push(ChatView::new(chat, creator_username, count, now));
        }
        Ok(views)
    }
}
