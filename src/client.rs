//! The browser-side application runtime, minus rendering: login view, protected
//! view mounts, focus/activity hooks and logout, all sharing one session store.

use std::sync::Arc;

use crate::error::AppResult;
use crate::events::EventBus;
use crate::identity::{
    Authenticator, ClientStorage, Clock, GuardedMount, Role, RouteGuard, SessionPolicy, SessionStore,
    SessionValidator, User,
};
use crate::routes::{path_has_prefix, path_only, post_login_target};

/// Sections restricted to one role. Everything else only needs a session.
const ROLE_RESTRICTED: &[(&str, Role)] = &[("/usuarios", Role::Admin), ("/configuracoes", Role::Admin)];

pub fn required_role(path: &str) -> Option<Role> {
    ROLE_RESTRICTED.iter().find(|(p, _)| path_has_prefix(path, p)).map(|(_, r)| *r)
}

#[derive(Clone)]
pub struct ClientApp {
    guard: RouteGuard,
    events: EventBus,
}

impl ClientApp {
    pub fn new(storage: Arc<dyn ClientStorage>, policy: SessionPolicy, clock: Arc<dyn Clock>) -> Self {
        let validator = SessionValidator::new(SessionStore::new(storage), policy, clock);
        Self { guard: RouteGuard::new(validator), events: EventBus::default() }
    }

    pub fn guard(&self) -> &RouteGuard { &self.guard }
    pub fn validator(&self) -> &SessionValidator { self.guard.validator() }
    pub fn sessions(&self) -> &SessionStore { self.guard.validator().store() }
    pub fn events(&self) -> &EventBus { &self.events }

    /// Submit the login form. On success the session is stored and the returned
    /// path is where the view should navigate next.
    pub async fn login(&self, auth: &Authenticator, email: &str, password: &str, redirect: Option<&str>) -> AppResult<String> {
        auth.sign_in(self.sessions(), email, password).await?;
        Ok(post_login_target(redirect))
    }

    /// Mount the view at `url` (path plus optional query) behind the guard.
    pub fn open(&self, url: &str) -> GuardedMount {
        let path = path_only(url);
        self.guard.mount(url, required_role(path))
    }

    pub fn mount(&self, path: &str, required: Option<Role>) -> GuardedMount {
        self.guard.mount(path, required)
    }

    /// Window regained focus.
    pub fn on_focus(&self) -> bool { self.validator().touch() }

    /// Explicit user activity signal.
    pub fn record_activity(&self) -> bool { self.validator().touch() }

    pub fn current_user(&self) -> Option<User> {
        self.validator().current().map(|s| s.user)
    }

    pub fn logout(&self) {
        if let Some(s) = self.sessions().load() {
            tracing::info!(target: "auth", user = %s.user.id, "signed out");
        }
        self.sessions().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_only_sections() {
        assert_eq!(required_role("/usuarios"), Some(Role::Admin));
        assert_eq!(required_role("/usuarios/novo"), Some(Role::Admin));
        assert_eq!(required_role("/caixa"), None);
        assert_eq!(required_role("/usuariosx"), None);
    }
}
