use std::sync::Arc;

use super::storage::ClientStorage;
use super::Session;

/// The one storage key holding the serialized session.
pub const SESSION_KEY: &str = "tesouraria.session";

/// Reads and writes the current session in client storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn ClientStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self { Self { storage } }

    /// Overwrites any prior session. Storage failures are logged and dropped.
    pub fn save(&self, session: &Session) {
        let payload = match serde_json::to_string(session) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(target: "session", "session not saved, encode failed: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(SESSION_KEY, &payload) {
            tracing::warn!(target: "session", user = %session.user.id, "session not saved: {e}");
        }
    }

    /// Missing or malformed content both yield `None`.
    pub fn load(&self) -> Option<Session> {
        let raw = self.storage.get_item(SESSION_KEY)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(target: "session", "malformed session payload treated as absent: {e}");
                None
            }
        }
    }

    pub fn clear(&self) {
        self.storage.remove_item(SESSION_KEY);
    }
}
