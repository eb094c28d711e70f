use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored status value for accounts allowed to authenticate
pub const ACTIVE_STATUS: &str = "active";

/// The resolved, store-backed record describing who is making a request.
/// Re-read on every request; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub status: String,
}

impl Identity {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// Identity plus the stored password hash, only loaded by the login flow
#[derive(Debug, Clone, FromRow)]
pub struct UserLogin {
    #[sqlx(flatten)]
    pub identity: Identity,
    pub password_hash: String,
}

/// Full row for administrative listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRecord {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account states an administrator may assign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => ACTIVE_STATUS,
            AccountStatus::Inactive => "inactive",
            AccountStatus::Suspended => "suspended",
        }
    }
}
