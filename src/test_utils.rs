//! Test utilities for chatsum
//!
//! Shared fixtures for unit tests: throwaway stores and sample users.

use crate::error::ChatsumError;
use crate::storage::{SqliteStore, User};
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

/// Create a relational store in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn create_test_store() -> (SqliteStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let store =
        SqliteStore::new_with_path(dir.path().join("chatsum.db")).expect("Failed to open store");
    (store, dir)
}

/// A user named `username` with an `@example.com` address; not yet stored
pub fn sample_user(username: &str) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        created_at: Utc::now(),
    }
}

/// Assert that an anyhow error wraps a `ChatsumError` of the given kind
///
/// # Panics
///
/// Panics if the result is Ok or the error kind differs
pub fn assert_error_kind<T: std::fmt::Debug>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!("Expected {} error, got Ok({:?})", expected, value),
        Err(e) => {
            let kind = e.downcast_ref::<ChatsumError>().map(|c| c.kind());
            assert_eq!(kind, Some(expected), "unexpected error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_users_are_distinct() {
        let a = sample_user("alice");
        let b = sample_user("alice");
        assert_ne!(a.id, b.id);
        assert_eq!(a.email, "alice@example.com");
    }

    #[test]
    fn test_assert_error_kind() {
        let result: crate::error::Result<()> = Err(ChatsumError::Conflict("taken".into()).into());
        assert_error_kind(result, "conflict");
    }
}
