use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identity key
    pub id: String,
    /// Unique display name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}
