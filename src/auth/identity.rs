use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// An authenticated subject: a patient or a staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// True when the password was changed after `issued_at_us` (unix micros).
    /// Stored change times keep microsecond precision, so only a token signed
    /// in the very microsecond of the change survives it.
    pub fn changed_password_after(&self, issued_at_us: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => changed_at.timestamp_micros() > issued_at_us,
            None => false,
        }
    }
}

/// Identity about to be stored; the hash is already computed
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
