//! Bearer credential resolution
//!
//! Every service call resolves its credential to an identity afresh; nothing
//! about the caller is kept between calls. Tokens are random, shown to the
//! user once at signup, and stored only as a SHA-256 hash.

use crate::error::{ChatsumError, Result};
use crate::storage::{blocking, SqliteStore};
use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// A verified caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

/// Turns a bearer credential into a verified identity
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns `ChatsumError::Unauthenticated` for a missing, malformed or
    /// unknown credential
    async fn resolve(&self, credential: &str) -> Result<Identity>;
}

/// A freshly issued token: plaintext for the user, hash for the store
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub hash: String,
}

/// Generate a new API token
///
/// # Examples
///
/// ```
/// use chatsum::identity::{hash_token, issue_token};
///
/// let issued = issue_token();
/// assert_eq!(issued.token.len(), 43);
/// assert_eq!(hash_token(&issued.token), issued.hash);
/// ```
pub fn issue_token() -> IssuedToken {
    use rand::RngCore as _;

    let mut random_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut random_bytes);
    let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);
    let hash = hash_token(&token);
    IssuedToken { token, hash }
}

/// Stored form of a token
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice())
}

/// Resolves tokens against the `api_tokens` table
#[derive(Debug, Clone)]
pub struct TokenResolver {
    store: SqliteStore,
}

impl TokenResolver {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Issue and record a token for `user_id`, returning the plaintext
    pub fn issue_for(&self, user_id: &str, now: DateTime<Utc>) -> Result<String> {
        let issued = issue_token();
        self.store.insert_token(&issued.hash, user_id, now)?;
        Ok(issued.token)
    }
}

#[async_trait]
impl IdentityResolver for TokenResolver {
    async fn resolve(&self, credential: &str) -> Result<Identity> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(ChatsumError::Unauthenticated("missing credential".into()).into());
        }

        let store = self.store.clone();
        let hash = hash_token(credential);
        match blocking(move || store.user_id_for_token(&hash)).await? {
            Some(user_id) => Ok(Identity { user_id }),
            None => {
                tracing::debug!("Rejected unknown credential");
                Err(ChatsumError::Unauthenticated("invalid credential".into()).into())
            }
        }
    }
}
