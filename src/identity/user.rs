use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Identity carried inside a session. Never contains the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// A row of the `users` table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool { true }

impl UserRecord {
    pub fn to_user(&self) -> User {
        User { id: self.id.clone(), email: self.email.clone(), name: self.name.clone(), role: self.role }
    }
}

// Keep the hash out of logs.
impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Lookup key form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
