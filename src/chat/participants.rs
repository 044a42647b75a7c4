//! Chat membership
//!
//! The membership relation is the access gate for every other component:
//! message reads and writes, summaries and chat lookups all check
//! [`ParticipantStore::is_member`] first.

use super::{Chat, ChatStatus};
use crate::error::{ChatsumError, Result};
use crate::storage::SqliteStore;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Membership operations over the relational store
#[derive(Debug, Clone)]
pub struct ParticipantStore {
    store: SqliteStore,
}

impl ParticipantStore {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    fn load_chat(&self, chat_id: &str) -> Result<Chat> {
        self.store
            .get_chat(chat_id)?
            .ok_or_else(|| ChatsumError::not_found("Chat", chat_id).into())
    }

    /// Add `user_id` to a chat on behalf of `caller_id`
    ///
    /// Only the creator may add members, and only while the chat is not
    /// completed. The role check comes before the status check so a
    /// non-creator is always told `NotAuthorized`.
    pub fn add(&self, chat_id: &str, caller_id: &str, user_id: &str, now: DateTime<Utc>) -> Result<()> {
        self.authorize_add(chat_id, caller_id, now)?;
        let user = self
            .store
            .get_user(user_id)?
            .ok_or_else(|| ChatsumError::not_found("User", user_id))?;
        self.insert(chat_id, &user.id, now)
    }

    /// Same as [`add`](Self::add), naming the new member by username
    pub fn add_by_username(
        &self,
        chat_id: &str,
        caller_id: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        self.authorize_add(chat_id, caller_id, now)?;
        let user = self
            .store
            .find_user_by_username(username.trim())?
            .ok_or_else(|| ChatsumError::not_found("User", username))?;
        self.insert(chat_id, &user.id, now)?;
        Ok(user.id)
    }

    fn authorize_add(&self, chat_id: &str, caller_id: &str, now: DateTime<Utc>) -> Result<Chat> {
        let chat = self.load_chat(chat_id)?;

        if !chat.is_creator(caller_id) {
            return Err(ChatsumError::NotAuthorized(
                "only the chat creator can add participants".to_string(),
            )
            .into());
        }

        if chat.status_at(now) == ChatStatus::Completed {
            return Err(ChatsumError::ChatClosed(chat_id.to_string()).into());
        }
        Ok(chat)
    }

    fn insert(&self, chat_id: &str, user_id: &str, now: DateTime<Utc>) -> Result<()> {
        if !self.store.insert_participant(chat_id, user_id, now)? {
            return Err(ChatsumError::AlreadyMember {
                chat_id: chat_id.to_string(),
                user_id: user_id.to_string(),
            }
            .into());
        }

        tracing::info!(chat_id, user_id, "Participant added");
        Ok(())
    }

    /// Remove `user_id` from a chat on behalf of `caller_id`
    pub fn remove(&self, chat_id: &str, caller_id: &str, user_id: &str) -> Result<()> {
        let chat = self.load_chat(chat_id)?;

        if !chat.is_creator(caller_id) {
            return Err(ChatsumError::NotAuthorized(
                "only the chat creator can remove participants".to_string(),
            )
            .into());
        }

        if chat.is_creator(user_id) {
            return Err(ChatsumError::CannotRemoveCreator(chat_id.to_string()).into());
        }

        if !self.store.delete_participant(chat_id, user_id)? {
            return Err(ChatsumError::not_member(chat_id).into());
        }

        tracing::info!(chat_id, user_id, "Participant removed");
        Ok(())
    }

    /// Member identities of a chat
    pub fn list(&self, chat_id: &str) -> Result<HashSet<String>> {
        Ok(self.store.participant_ids(chat_id)?.into_iter().collect())
    }

    pub fn is_member(&self, chat_id: &str, user_id: &str) -> Result<bool> {
        self.store.is_participant(chat_id, user_id)
    }

    pub fn count(&self, chat_id: &str) -> Result<usize> {
        self.store.participant_count(chat_id)
    }

    /// Usernames of a chat's members; visible to members only
    pub fn list_usernames(&self, chat_id: &str, caller_id: &str) -> Result<Vec<String>> {
        self.load_chat(chat_id)?;
        if !self.is_member(chat_id, caller_id)? {
            return Err(ChatsumError::not_member(chat_id).into());
        }
        self.store.participant_usernames(chat_id)
    }

    /// Remove the caller's own membership; used by a non-creator exit
    pub(crate) fn leave(&self, chat_id: &str, user_id: &str) -> Result<bool> {
        self.store.delete_participant(chat_id, user_id)
    }
}
