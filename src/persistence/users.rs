use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{Filter, ResourceStore, Row, StoreError, StoreResult};
use crate::identity::{normalize_email, Role, UserRecord};

pub const USERS_TABLE: &str = "users";

/// Input for provisioning an identity. The password is hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Typed access to the `users` table.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn ResourceStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self { Self { store } }

    pub async fn count(&self) -> StoreResult<usize> {
        self.store.count(USERS_TABLE).await
    }

    /// Case-insensitive lookup. Rows that fail to decode are skipped with a warning.
    pub async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let email = normalize_email(email);
        let rows = self.store.select(USERS_TABLE, &[Filter::eq_ignore_case("email", email.as_str())]).await?;
        Ok(rows.into_iter().find_map(decode_row))
    }

    pub async fn insert(&self, user: NewUser, password_hash: String, now: DateTime<Utc>) -> StoreResult<UserRecord> {
        let email = normalize_email(&user.email);
        if email.is_empty() {
            return Err(StoreError::InvalidRow("email must not be empty".into()));
        }
        let row = to_row(json!({
            "email": email,
            "name": user.name,
            "password_hash": password_hash,
            "role": user.role,
            "active": true,
            "created_at": now,
            "updated_at": now,
        }));
        let stored = self.store.insert(USERS_TABLE, row).await?;
        decode_row(stored).ok_or_else(|| StoreError::InvalidRow("stored user row did not decode".into()))
    }

    pub async fn update_password(&self, id: &str, password_hash: String, now: DateTime<Utc>) -> StoreResult<bool> {
        let patch = to_row(json!({ "password_hash": password_hash, "updated_at": now }));
        Ok(self.store.update(USERS_TABLE, id, patch).await?.is_some())
    }

    pub async fn set_active(&self, id: &str, active: bool, now: DateTime<Utc>) -> StoreResult<bool> {
        let patch = to_row(json!({ "active": active, "updated_at": now }));
        Ok(self.store.update(USERS_TABLE, id, patch).await?.is_some())
    }
}

fn to_row(v: Value) -> Row {
    match v {
        Value::Object(m) => m,
        _ => Row::new(),
    }
}

fn decode_row(row: Row) -> Option<UserRecord> {
    match serde_json::from_value::<UserRecord>(Value::Object(row)) {
        Ok(u) => Some(u),
        Err(e) => {
            tracing::warn!(target: "persistence", "skipping undecodable users row: {e}");
            None
        }
    }
}
