//! Relational store for users, chats, participants and API tokens
//!
//! Backed by SQLite. Each call opens its own connection, so the store is
//! cheap to clone and safe to share between request handlers; invariants that
//! span rows (chat plus initial participants) are written in one transaction.

use crate::chat::{Chat, ClosedReason};
use crate::error::{ChatsumError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod types;
pub use types::User;

/// Environment variable that overrides the default database location
pub const DATABASE_ENV: &str = "CHATSUM_DB";

/// Run synchronous store or log work on tokio's blocking pool
///
/// Request handlers go through this so SQLite and sled I/O never occupies
/// an async worker thread.
pub async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ChatsumError::Storage(format!("Storage task failed: {}", e)))?
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS api_tokens (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS chats (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    creator_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL,
    start_time TEXT,
    end_time TEXT NOT NULL,
    closed_at TEXT,
    closed_reason TEXT
);
CREATE TABLE IF NOT EXISTS chat_participants (
    chat_id TEXT NOT NULL REFERENCES chats(id),
    user_id TEXT NOT NULL REFERENCES users(id),
    joined_at TEXT NOT NULL,
    PRIMARY KEY (chat_id, user_id)
);
CREATE INDEX IF NOT EXISTS idx_chat_participants_user ON chat_participants(user_id);
";

const CHAT_COLUMNS: &str =
    "id, name, description, creator_id, created_at, start_time, end_time, closed_at, closed_reason";

/// Map any displayable error into `ChatsumError::Storage` with context
pub(crate) trait StorageResultExt<T> {
    fn storage_context(self, what: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> StorageResultExt<T> for std::result::Result<T, E> {
    fn storage_context(self, what: &str) -> Result<T> {
        self.map_err(|e| ChatsumError::Storage(format!("{}: {}", what, e)).into())
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(idx, &v)).transpose()
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    let created_at: String = row.get(4)?;
    let end_time: String = row.get(6)?;
    let closed_reason: Option<String> = row.get(8)?;
    let closed_reason = closed_reason
        .map(|r| {
            r.parse::<ClosedReason>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(Chat {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        creator_id: row.get(3)?,
        created_at: parse_timestamp(4, &created_at)?,
        start_time: parse_optional_timestamp(5, row.get(5)?)?,
        end_time: parse_timestamp(6, &end_time)?,
        closed_at: parse_optional_timestamp(7, row.get(7)?)?,
        closed_reason,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_timestamp(3, &created_at)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// SQLite-backed record store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a new store instance
    ///
    /// Uses `CHATSUM_DB` when set, otherwise `chatsum.db` in the user's data
    /// directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(DATABASE_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("dev", "chatsum", "chatsum")
            .ok_or_else(|| ChatsumError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("chatsum.db"))
    }

    /// Create a new store that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatsum::storage::SqliteStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("chatsum.db")).unwrap();
    /// assert!(store.path().exists());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .storage_context("Failed to create parent directory for database")?;
        }

        let store = Self { db_path };
        store.init()?;
        tracing::debug!("Opened relational store at {}", store.db_path.display());
        Ok(store)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path).storage_context("Failed to open database")?;
        conn.busy_timeout(Duration::from_secs(5))
            .storage_context("Failed to set busy timeout")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .storage_context("Failed to enable foreign keys")?;
        Ok(conn)
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(SCHEMA)
            .storage_context("Failed to create tables")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert a user; `Conflict` if the username or email is taken
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.open()?;
        match conn.execute(
            "INSERT INTO users (id, username, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id,
                user.username,
                user.email,
                format_timestamp(&user.created_at)
            ],
        ) {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(ChatsumError::Conflict(
                "a user with this username or email already exists".to_string(),
            )
            .into()),
            Err(e) => Err(ChatsumError::Storage(format!("Failed to insert user: {}", e)).into()),
        }
    }

    /// Look up a user by id
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.query_user("SELECT id, username, email, created_at FROM users WHERE id = ?1", id)
    }

    /// Look up a user by username (case-insensitive)
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_user(
            "SELECT id, username, email, created_at FROM users WHERE username = ?1",
            username,
        )
    }

    /// Look up a user by email (case-insensitive)
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_user(
            "SELECT id, username, email, created_at FROM users WHERE email = ?1",
            email,
        )
    }

    fn query_user(&self, sql: &str, key: &str) -> Result<Option<User>> {
        let conn = self.open()?;
        conn.query_row(sql, params![key], user_from_row)
            .optional()
            .storage_context("Failed to query user")
    }

    /// Case-insensitive substring search over username and email
    pub fn search_users(&self, query: &str, exclude_id: &str, limit: usize) -> Result<Vec<User>> {
        let conn = self.open()?;
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = conn
            .prepare(
                "SELECT id, username, email, created_at FROM users
                WHERE (username LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\') AND id != ?2
                ORDER BY username
                LIMIT ?3",
            )
            .storage_context("Failed to prepare statement")?;

        let users = stmt
            .query_map(params![pattern, exclude_id, limit as i64], user_from_row)
            .storage_context("Failed to search users")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage_context("Failed to read user row")?;
        Ok(users)
    }

    // ------------------------------------------------------------------
    // API tokens
    // ------------------------------------------------------------------

    /// Record the hash of an issued bearer token
    pub fn insert_token(&self, token_hash: &str, user_id: &str, now: DateTime<Utc>) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO api_tokens (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token_hash, user_id, format_timestamp(&now)],
        )
        .storage_context("Failed to insert token")?;
        Ok(())
    }

    /// Resolve a token hash to its owner
    pub fn user_id_for_token(&self, token_hash: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT user_id FROM api_tokens WHERE token_hash = ?1",
            params![token_hash],
            |row| row.get(0),
        )
        .optional()
        .storage_context("Failed to query token")
    }

    // ------------------------------------------------------------------
    // Chats
    // ------------------------------------------------------------------

    /// Insert a chat together with its initial participants
    pub fn insert_chat(&self, chat: &Chat, participants: &[String]) -> Result<()> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .storage_context("Failed to start transaction")?;

        tx.execute(
            "INSERT INTO chats (id, name, description, creator_id, created_at, start_time, end_time, closed_at, closed_reason)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                chat.id,
                chat.name,
                chat.description,
                chat.creator_id,
                format_timestamp(&chat.created_at),
                chat.start_time.as_ref().map(format_timestamp),
                format_timestamp(&chat.end_time),
                chat.closed_at.as_ref().map(format_timestamp),
                chat.closed_reason.map(|r| r.as_str()),
            ],
        )
        .storage_context("Failed to insert chat")?;

        let joined_at = format_timestamp(&chat.created_at);
        for user_id in participants {
            tx.execute(
                "INSERT OR IGNORE INTO chat_participants (chat_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
                params![chat.id, user_id, joined_at],
            )
            .storage_context("Failed to insert participant")?;
        }

        tx.commit().storage_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Look up a chat by id
    pub fn get_chat(&self, id: &str) -> Result<Option<Chat>> {
        let conn = self.open()?;
        conn.query_row(
            &format!("SELECT {} FROM chats WHERE id = ?1", CHAT_COLUMNS),
            params![id],
            chat_from_row,
        )
        .optional()
        .storage_context("Failed to query chat")
    }

    /// Set the terminal marker; returns false if it was already set
    pub fn mark_chat_closed(&self, id: &str, reason: ClosedReason, at: DateTime<Utc>) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn
            .execute(
                "UPDATE chats SET closed_at = ?1, closed_reason = ?2 WHERE id = ?3 AND closed_at IS NULL",
                params![format_timestamp(&at), reason.as_str(), id],
            )
            .storage_context("Failed to close chat")?;
        Ok(changed == 1)
    }

    /// Chats where the user is currently a participant, newest first
    pub fn chats_for_user(&self, user_id: &str) -> Result<Vec<Chat>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.name, c.description, c.creator_id, c.created_at, c.start_time, c.end_time, c.closed_at, c.closed_reason
                FROM chats c
                JOIN chat_participants p ON p.chat_id = c.id
                WHERE p.user_id = ?1
                ORDER BY c.created_at DESC",
            )
            .storage_context("Failed to prepare statement")?;

        let chats = stmt
            .query_map(params![user_id], chat_from_row)
            .storage_context("Failed to query chats")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage_context("Failed to read chat row")?;
        Ok(chats)
    }

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    /// Insert a membership; returns false if it already existed
    pub fn insert_participant(&self, chat_id: &str, user_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let conn = self.open()?;
        match conn.execute(
            "INSERT INTO chat_participants (chat_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![chat_id, user_id, format_timestamp(&now)],
        ) {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(ChatsumError::Storage(format!("Failed to insert participant: {}", e)).into()),
        }
    }

    /// Delete a membership; returns false if there was none
    pub fn delete_participant(&self, chat_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn
            .execute(
                "DELETE FROM chat_participants WHERE chat_id = ?1 AND user_id = ?2",
                params![chat_id, user_id],
            )
            .storage_context("Failed to delete participant")?;
        Ok(changed > 0)
    }

    /// Whether a membership exists
    pub fn is_participant(&self, chat_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.open()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM chat_participants WHERE chat_id = ?1 AND user_id = ?2",
                params![chat_id, user_id],
                |_| Ok(true),
            )
            .optional()
            .storage_context("Failed to query participant")?;
        Ok(found.unwrap_or(false))
    }

    /// Ids of every participant of a chat
    pub fn participant_ids(&self, chat_id: &str) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT user_id FROM chat_participants WHERE chat_id = ?1")
            .storage_context("Failed to prepare statement")?;
        let ids = stmt
            .query_map(params![chat_id], |row| row.get(0))
            .storage_context("Failed to query participants")?
            .collect::<rusqlite::Result<Vec<String>>>()
            .storage_context("Failed to read participant row")?;
        Ok(ids)
    }

    /// Number of participants of a chat
    pub fn participant_count(&self, chat_id: &str) -> Result<usize> {
        let conn = self.open()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM chat_participants WHERE chat_id = ?1",
                params![chat_id],
                |row| row.get(0),
            )
            .storage_context("Failed to count participants")?;
        Ok(count as usize)
    }

    /// Usernames of every participant, in join order
    pub fn participant_usernames(&self, chat_id: &str) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT u.username FROM chat_participants p
                JOIN users u ON u.id = p.user_id
                WHERE p.chat_id = ?1
                ORDER BY p.joined_at, u.username",
            )
            .storage_context("Failed to prepare statement")?;
        let names = stmt
            .query_map(params![chat_id], |row| row.get(0))
            .storage_context("Failed to query participant names")?
            .collect::<rusqlite::Result<Vec<String>>>()
            .storage_context("Failed to read participant row")?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_store, sample_user};
    use chrono::Duration;
    use serial_test::serial;
    use std::env;

    fn sample_chat(id: &str, creator: &str, created_at: DateTime<Utc>) -> Chat {
        Chat {
            id: id.to_string(),
            name: format!("chat {}", id),
            description: Some("weekly sync".to_string()),
            creator_id: creator.to_string(),
            created_at,
            start_time: None,
            end_time: created_at + Duration::hours(1),
            closed_at: None,
            closed_reason: None,
        }
    }

    #[test]
    fn test_init_creates_tables() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN ('users', 'chats', 'chat_participants', 'api_tokens')",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 4);
    }

    #[test]
    fn test_insert_and_get_user() {
        let (store, _dir) = create_test_store();
        let user = sample_user("alice");
        store.insert_user(&user).expect("insert failed");

        assert_eq!(store.get_user(&user.id).unwrap(), Some(user.clone()));
        assert_eq!(
            store.find_user_by_username("ALICE").unwrap().map(|u| u.id),
            Some(user.id.clone())
        );
        assert_eq!(
            store.find_user_by_email("alice@example.com").unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(store.get_user("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let (store, _dir) = create_test_store();
        store.insert_user(&sample_user("alice")).unwrap();

        let mut dup = sample_user("alice");
        dup.email = "other@example.com".to_string();
        let err = store.insert_user(&dup).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatsumError>(),
            Some(ChatsumError::Conflict(_))
        ));
    }

    #[test]
    fn test_search_users_excludes_caller_and_escapes_wildcards() {
        let (store, _dir) = create_test_store();
        let alice = sample_user("alice");
        let alina = sample_user("alina");
        let bob = sample_user("bob");
        for u in [&alice, &alina, &bob] {
            store.insert_user(u).unwrap();
        }

        let found = store.search_users("AL", &alice.id, 10).unwrap();
        let names: Vec<_> = found.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alina"]);

        assert!(store.search_users("%", "", 10).unwrap().is_empty());
        assert_eq!(store.search_users("example", "", 2).unwrap().len(), 2);
    }

    #[test]
    fn test_insert_chat_with_participants_roundtrip() {
        let (store, _dir) = create_test_store();
        let alice = sample_user("alice");
        let bob = sample_user("bob");
        store.insert_user(&alice).unwrap();
        store.insert_user(&bob).unwrap();

        let chat = sample_chat("c1", &alice.id, Utc::now());
        store
            .insert_chat(&chat, &[alice.id.clone(), bob.id.clone(), bob.id.clone()])
            .expect("insert chat");

        assert_eq!(store.get_chat("c1").unwrap(), Some(chat));
        assert_eq!(store.participant_count("c1").unwrap(), 2);
        assert!(store.is_participant("c1", &bob.id).unwrap());
        assert_eq!(
            store.participant_usernames("c1").unwrap(),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn test_mark_chat_closed_is_one_way() {
        let (store, _dir) = create_test_store();
        let alice = sample_user("alice");
        store.insert_user(&alice).unwrap();
        let now = Utc::now();
        store
            .insert_chat(&sample_chat("c1", &alice.id, now), &[alice.id.clone()])
            .unwrap();

        assert!(store.mark_chat_closed("c1", ClosedReason::Exited, now).unwrap());
        assert!(!store
            .mark_chat_closed("c1", ClosedReason::Deleted, now + Duration::minutes(1))
            .unwrap());

        let chat = store.get_chat("c1").unwrap().unwrap();
        assert_eq!(chat.closed_reason, Some(ClosedReason::Exited));
        assert_eq!(chat.closed_at, Some(now));
    }

    #[test]
    fn test_chats_for_user_newest_first() {
        let (store, _dir) = create_test_store();
        let alice = sample_user("alice");
        store.insert_user(&alice).unwrap();
        let now = Utc::now();
        store
            .insert_chat(&sample_chat("older", &alice.id, now), &[alice.id.clone()])
            .unwrap();
        store
            .insert_chat(
                &sample_chat("newer", &alice.id, now + Duration::seconds(5)),
                &[alice.id.clone()],
            )
            .unwrap();

        let ids: Vec<_> = store
            .chats_for_user(&alice.id)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["newer".to_string(), "older".to_string()]);
        assert!(store.chats_for_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_participant_insert_and_delete() {
        let (store, _dir) = create_test_store();
        let alice = sample_user("alice");
        let bob = sample_user("bob");
        store.insert_user(&alice).unwrap();
        store.insert_user(&bob).unwrap();
        let now = Utc::now();
        store
            .insert_chat(&sample_chat("c1", &alice.id, now), &[alice.id.clone()])
            .unwrap();

        assert!(store.insert_participant("c1", &bob.id, now).unwrap());
        assert!(!store.insert_participant("c1", &bob.id, now).unwrap());
        assert!(store.delete_participant("c1", &bob.id).unwrap());
        assert!(!store.delete_participant("c1", &bob.id).unwrap());
    }

    #[test]
    fn test_token_lookup() {
        let (store, _dir) = create_test_store();
        let alice = sample_user("alice");
        store.insert_user(&alice).unwrap();
        store.insert_token("hash-1", &alice.id, Utc::now()).unwrap();

        assert_eq!(
            store.user_id_for_token("hash-1").unwrap(),
            Some(alice.id.clone())
        );
        assert_eq!(store.user_id_for_token("hash-2").unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("chatsum.db");
        env::set_var(DATABASE_ENV, db_path.to_string_lossy().to_string());

        let store = SqliteStore::new().expect("new failed with env override");
        assert_eq!(store.path(), db_path.as_path());
        assert!(db_path.parent().unwrap().exists());

        env::remove_var(DATABASE_ENV);
    }

    #[tokio::test]
    async fn test_blocking_runs_store_calls_off_the_runtime() {
        let (store, _dir) = create_test_store();
        let alice = sample_user("alice");
        let id = alice.id.clone();

        let found = blocking(move || {
            store.insert_user(&alice)?;
            store.get_user(&id)
        })
        .await
        .unwrap();
        assert_eq!(found.map(|u| u.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_blocking_reports_panicked_work_as_storage_error() {
        let result: Result<()> = blocking(|| panic!("disk went away")).await;
        crate::test_utils::assert_error_kind(result, "storage");
    }
}
