//! Chat entities and their temporal lifecycle
//!
//! A chat's status is never stored. It is derived on every read from the
//! current time, the chat's schedule and a one-way terminal marker that is
//! set when the creator exits or deletes the chat.

pub mod participants;
pub mod registry;

pub use participants::ParticipantStore;
pub use registry::{ChatRegistry, ExitOutcome};

use crate::error::{ChatsumError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum chat name length, in characters
pub const MAX_NAME_LEN: usize = 100;

/// Lifecycle stage of a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    /// `start_time` is still in the future
    Scheduled,
    /// Inside the time window and not closed
    Active,
    /// Past `end_time`, or closed by the creator
    Completed,
}

impl ChatStatus {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a chat carries the terminal marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosedReason {
    /// The creator left the chat
    Exited,
    /// The creator deleted the chat
    Deleted,
}

impl ClosedReason {
    /// Lowercase storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exited => "exited",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for ClosedReason {
    type Err = ChatsumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "exited" => Ok(Self::Exited),
            "deleted" => Ok(Self::Deleted),
            other => Err(ChatsumError::Storage(format!(
                "Unknown closed reason: {}",
                other
            ))),
        }
    }
}

/// Derive a chat's status
///
/// Pure function of its inputs: `completed` once `now >= end_time` or the
/// terminal marker is set, `scheduled` while `now < start_time`, otherwise
/// `active`.
///
/// # Examples
///
/// ```
/// use chatsum::chat::{derive_status, ChatStatus};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let end = now + Duration::hours(1);
/// assert_eq!(derive_status(now, None, end, false), ChatStatus::Active);
/// assert_eq!(derive_status(now, Some(now + Duration::minutes(5)), end, false), ChatStatus::Scheduled);
/// assert_eq!(derive_status(now, None, end, true), ChatStatus::Completed);
/// ```
pub fn derive_status(
    now: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    end_time: DateTime<Utc>,
    terminal: bool,
) -> ChatStatus {
    if terminal || now >= end_time {
        return ChatStatus::Completed;
    }
    match start_time {
        Some(start) if now < start => ChatStatus::Scheduled,
        _ => ChatStatus::Active,
    }
}

/// Check a requested schedule against the creation time
///
/// `end_time` must be strictly in the future. A supplied `start_time` must
/// not be in the past and must precede `end_time`.
pub fn validate_schedule(
    start_time: Option<DateTime<Utc>>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    if end_time <= now {
        return Err(
            ChatsumError::InvalidSchedule("end time must be in the future".to_string()).into(),
        );
    }
    if let Some(start) = start_time {
        if start < now {
            return Err(ChatsumError::InvalidSchedule(
                "scheduled start time cannot be in the past".to_string(),
            )
            .into());
        }
        if start >= end_time {
            return Err(ChatsumError::InvalidSchedule(
                "end time must be after start time".to_string(),
            )
            .into());
        }
    }
    Ok(())
}

/// Persisted chat record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// User that created the chat and owns its lifecycle
    pub creator_id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Optional scheduled start; `None` means the chat starts at creation
    pub start_time: Option<DateTime<Utc>>,
    /// Scheduled end
    pub end_time: DateTime<Utc>,
    /// When the terminal marker was set
    pub closed_at: Option<DateTime<Utc>>,
    /// Why the terminal marker was set
    pub closed_reason: Option<ClosedReason>,
}

impl Chat {
    /// Whether the creator has exited or deleted the chat
    pub fn is_terminal(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Status of this chat at `now`
    pub fn status_at(&self, now: DateTime<Utc>) -> ChatStatus {
        derive_status(now, self.start_time, self.end_time, self.is_terminal())
    }

    /// Whether `user_id` created this chat
    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }
}

/// Chat as returned to callers, annotated with live state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: String,
    pub creator_username: String,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    pub status: ChatStatus,
    pub participants_count: usize,
}

impl ChatView {
    pub(crate) fn new(
        chat: &Chat,
        creator_username: String,
        participants_count: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: chat.id.clone(),
            name: chat.name.clone(),
            description: chat.description.clone(),
            creator_id: chat.creator_id.clone(),
            creator_username,
            created_at: chat.created_at,
            start_time: chat.start_time,
            end_time: chat.end_time,
            status: chat.status_at(now),
            participants_count,
        }
    }
}

/// Request to create a chat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewChat {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "zoned::deserialize_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "zoned::deserialize")]
    pub end_time: DateTime<Utc>,
    /// Users to add by id; unknown ids are skipped
    #[serde(default)]
    pub invited_ids: Vec<String>,
    /// Users to add by email; unknown addresses are skipped
    #[serde(default)]
    pub invited_emails: Vec<String>,
}

/// Request timestamps must carry a UTC offset
mod zoned {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    fn parse<E: Error>(raw: &str) -> std::result::Result<DateTime<Utc>, E> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        if raw.parse::<NaiveDateTime>().is_ok() {
            return Err(E::custom(format!(
                "timestamp {} must be timezone-aware (e.g. include 'Z' or '+00:00')",
                raw
            )));
        }
        Err(E::custom(format!("invalid RFC 3339 timestamp {}", raw)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
    }

    pub fn deserialize_option<'de, D>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_status_without_start_is_active_until_end() {
        let end = t0() + Duration::minutes(60);
        assert_eq!(derive_status(t0(), None, end, false), ChatStatus::Active);
        assert_eq!(
            derive_status(end - Duration::seconds(1), None, end, false),
            ChatStatus::Active
        );
        assert_eq!(derive_status(end, None, end, false), ChatStatus::Completed);
    }

    #[test]
    fn test_status_timeline_for_scheduled_chat() {
        let start = t0() + Duration::minutes(10);
        let end = t0() + Duration::minutes(60);
        let at = |m| derive_status(t0() + Duration::minutes(m), Some(start), end, false);

        assert_eq!(at(5), ChatStatus::Scheduled);
        assert_eq!(at(10), ChatStatus::Active);
        assert_eq!(at(15), ChatStatus::Active);
        assert_eq!(at(61), ChatStatus::Completed);
    }

    #[test]
    fn test_terminal_flag_overrides_window() {
        let start = t0() + Duration::minutes(10);
        let end = t0() + Duration::minutes(60);
        assert_eq!(
            derive_status(t0(), Some(start), end, true),
            ChatStatus::Completed
        );
        assert_eq!(
            derive_status(t0() + Duration::minutes(20), Some(start), end, true),
            ChatStatus::Completed
        );
    }

    #[test]
    fn test_status_is_independent_of_call_order() {
        let start = Some(t0() + Duration::minutes(10));
        let end = t0() + Duration::minutes(60);
        let instants: Vec<_> = [61, 5, 15, 5, 61, 15]
            .iter()
            .map(|m| t0() + Duration::minutes(*m))
            .collect();

        let first: Vec<_> = instants
            .iter()
            .map(|now| derive_status(*now, start, end, false))
            .collect();
        let second: Vec<_> = instants
            .iter()
            .rev()
            .map(|now| derive_status(*now, start, end, false))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_schedule_rejects_past_end() {
        let err = validate_schedule(None, t0() - Duration::seconds(1), t0()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatsumError>(),
            Some(ChatsumError::InvalidSchedule(_))
        ));
        // end == now is not in the future either
        assert!(validate_schedule(None, t0(), t0()).is_err());
    }

    #[test]
    fn test_validate_schedule_rejects_start_not_before_end() {
        let end = t0() + Duration::minutes(30);
        assert!(validate_schedule(Some(end), end, t0()).is_err());
        assert!(validate_schedule(Some(end + Duration::minutes(1)), end, t0()).is_err());
    }

    #[test]
    fn test_validate_schedule_rejects_past_start() {
        let end = t0() + Duration::minutes(30);
        assert!(validate_schedule(Some(t0() - Duration::minutes(1)), end, t0()).is_err());
    }

    #[test]
    fn test_validate_schedule_accepts_valid_windows() {
        let end = t0() + Duration::minutes(30);
        assert!(validate_schedule(None, end, t0()).is_ok());
        assert!(validate_schedule(Some(t0()), end, t0()).is_ok());
        assert!(validate_schedule(Some(t0() + Duration::minutes(5)), end, t0()).is_ok());
    }

    #[test]
    fn test_chat_status_serializes_lowercase() {
        let json = serde_json::to_string(&ChatStatus::Scheduled).unwrap();
        assert_eq!(json, "\"scheduled\"");
    }

    #[test]
    fn test_closed_reason_parse() {
        assert_eq!(
            "exited".parse::<ClosedReason>().unwrap(),
            ClosedReason::Exited
        );
        assert_eq!(
            "deleted".parse::<ClosedReason>().unwrap(),
            ClosedReason::Deleted
        );
        assert!("gone".parse::<ClosedReason>().is_err());
    }

    #[test]
    fn test_new_chat_requires_zoned_timestamps() {
        let chat: NewChat = serde_json::from_str(
            r#"{"name": "sync", "start_time": "2030-01-01T09:00:00+02:00", "end_time": "2030-01-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            chat.start_time,
            Some(Utc.with_ymd_and_hms(2030, 1, 1, 7, 0, 0).unwrap())
        );
        assert_eq!(chat.end_time, Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap());

        let err = serde_json::from_str::<NewChat>(r#"{"name": "sync", "end_time": "2030-01-01T10:00:00"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("timezone-aware"));

        let err = serde_json::from_str::<NewChat>(
            r#"{"name": "sync", "start_time": "2030-01-01T09:00:00", "end_time": "2030-01-01T10:00:00Z"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timezone-aware"));

        let chat: NewChat = serde_json::from_str(
            r#"{"name": "sync", "start_time": null, "end_time": "2030-01-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(chat.start_time, None);
    }
}
