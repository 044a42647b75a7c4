//! User accounts: signup, lookup and search

use crate::error::{ChatsumError, Result};
use crate::identity::TokenResolver;
use crate::storage::{SqliteStore, User};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of search results
pub const SEARCH_LIMIT: usize = 10;

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.-]{3,32}$";
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

fn matches(pattern: &str, value: &str) -> Result<bool> {
    Ok(Regex::new(pattern)?.is_match(value))
}

/// A new account and its one-time API token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub user: User,
    /// Plaintext bearer token; only ever returned here
    pub token: String,
}

/// Account operations
#[derive(Debug, Clone)]
pub struct UserDirectory {
    store: SqliteStore,
    tokens: TokenResolver,
}

impl UserDirectory {
    pub fn new(store: SqliteStore, tokens: TokenResolver) -> Self {
        Self { store, tokens }
    }

    /// Create an account and issue its first token
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a malformed username or email, `Conflict` when
    /// either is already registered.
    pub fn register(&self, username: &str, email: &str, now: DateTime<Utc>) -> Result<Registration> {
        let username = username.trim();
        let email = email.trim();

        if !matches(USERNAME_PATTERN, username)? {
            return Err(ChatsumError::InvalidRequest(
                "username must be 3-32 letters, digits, '.', '_' or '-'".into(),
            )
            .into());
        }
        if !matches(EMAIL_PATTERN, email)? {
            return Err(ChatsumError::InvalidRequest("email address is not valid".into()).into());
        }

        if self.store.find_user_by_username(username)?.is_some() {
            return Err(ChatsumError::Conflict("username is already taken".into()).into());
        }
        if self.store.find_user_by_email(email)?.is_some() {
            return Err(ChatsumError::Conflict("email is already registered".into()).into());
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: now,
        };
        self.store.insert_user(&user)?;
        let token = self.tokens.issue_for(&user.id, now)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(Registration { user, token })
    }

    /// Look up a user by id
    pub fn get(&self, user_id: &str) -> Result<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| ChatsumError::not_found("User", user_id).into())
    }

    /// Users whose username or email contains `query`, excluding the caller
    pub fn search(&self, caller_id: &str, query: &str) -> Result<Vec<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatsumError::InvalidRequest("search query must not be empty".into()).into());
        }
        self.store.search_users(query, caller_id, SEARCH_LIMIT)
    }
}
