use std::sync::Arc;

use super::clock::Clock;
use super::session::{Session, SessionPolicy};
use super::store::SessionStore;

/// Applies [`SessionPolicy`] to the stored session and keeps its activity
/// timestamp fresh.
#[derive(Clone)]
pub struct SessionValidator {
    store: SessionStore,
    policy: SessionPolicy,
    clock: Arc<dyn Clock>,
}

impl SessionValidator {
    pub fn new(store: SessionStore, policy: SessionPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { store, policy, clock }
    }

    pub fn policy(&self) -> &SessionPolicy { &self.policy }
    pub fn store(&self) -> &SessionStore { &self.store }
    pub fn clock(&self) -> &Arc<dyn Clock> { &self.clock }

    pub fn is_valid(&self, session: Option<&Session>) -> bool {
        match session {
            Some(s) => self.policy.check(s, self.clock.now()).is_ok(),
            None => false,
        }
    }

    /// The stored session if it is valid. An invalid one is cleared.
    pub fn current(&self) -> Option<Session> {
        let session = self.store.load()?;
        match self.policy.check(&session, self.clock.now()) {
            Ok(()) => Some(session),
            Err(why) => {
                tracing::info!(target: "session", user = %session.user.id, reason = why.as_str(), "session rejected");
                self.store.clear();
                None
            }
        }
    }

    /// Refresh `last_activity_at` on a valid stored session; returns whether it did.
    pub fn touch(&self) -> bool {
        let Some(mut session) = self.current() else { return false; };
        session.last_activity_at = self.clock.now();
        self.store.save(&session);
        crate::tprintln!("session.touch user={} at={}", session.user.id, session.last_activity_at);
        true
    }
}
