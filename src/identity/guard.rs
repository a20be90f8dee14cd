//! Route protection for views that require a signed-in user.
//!
//! Each mount of a protected view runs one evaluation: `Checking` resolves
//! synchronously to `Authorized` or `Redirecting`. There is no continuous
//! re-check; a session that expires while the view is open is caught on the
//! next mount or the next focus/activity touch. An authorized mount owns the
//! activity refresher and stops it when dropped.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::routes::{login_redirect, DEFAULT_LANDING_PATH};

use super::validator::SessionValidator;
use super::{Role, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(Session),
    /// No valid session; `target` is the login path with the return destination.
    RedirectToLogin { target: String },
    /// Signed in but lacking the required role.
    RedirectToDefault { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized(Session),
    Redirecting { target: String },
}

impl GuardState {
    pub fn is_authorized(&self) -> bool { matches!(self, GuardState::Authorized(_)) }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardState::Redirecting { target } => Some(target.as_str()),
            _ => None,
        }
    }
}

/// Exact role match, spelled out so a new role forces a decision here.
fn role_satisfies(actual: Role, required: Role) -> bool {
    match required {
        Role::Admin => matches!(actual, Role::Admin),
        Role::Tesouraria => matches!(actual, Role::Tesouraria),
        Role::Secretaria => matches!(actual, Role::Secretaria),
        Role::Pastor => matches!(actual, Role::Pastor),
        Role::Auditor => matches!(actual, Role::Auditor),
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    validator: SessionValidator,
}

impl RouteGuard {
    pub fn new(validator: SessionValidator) -> Self { Self { validator } }

    pub fn validator(&self) -> &SessionValidator { &self.validator }

    pub fn evaluate(&self, path: &str, required: Option<Role>) -> GuardDecision {
        let Some(session) = self.validator.current() else {
            return GuardDecision::RedirectToLogin { target: login_redirect(path) };
        };
        match required {
            Some(role) if !role_satisfies(session.user.role, role) => {
                tracing::info!(
                    target: "guard",
                    user = %session.user.id, has = %session.user.role, needs = %role, path = path,
                    "role mismatch"
                );
                GuardDecision::RedirectToDefault { target: DEFAULT_LANDING_PATH.to_string() }
            }
            _ => GuardDecision::Allow(session),
        }
    }

    /// Mount a protected view at `path`. Starts the activity refresher when
    /// authorized and a tokio runtime is available.
    pub fn mount(&self, path: &str, required: Option<Role>) -> GuardedMount {
        let mut mount = GuardedMount { path: path.to_string(), state: GuardState::Checking, refresher: None };
        mount.state = match self.evaluate(path, required) {
            GuardDecision::Allow(session) => {
                mount.refresher = ActivityRefresher::spawn(self.validator.clone());
                GuardState::Authorized(session)
            }
            GuardDecision::RedirectToLogin { target } | GuardDecision::RedirectToDefault { target } => {
                tracing::debug!(target: "guard", path = path, to = %target, "redirecting");
                GuardState::Redirecting { target }
            }
        };
        mount
    }
}

/// A protected view while it is on screen.
#[derive(Debug)]
pub struct GuardedMount {
    path: String,
    state: GuardState,
    refresher: Option<ActivityRefresher>,
}

impl GuardedMount {
    pub fn path(&self) -> &str { &self.path }
    pub fn state(&self) -> &GuardState { &self.state }
    pub fn has_refresher(&self) -> bool { self.refresher.is_some() }

    /// Explicit unmount; dropping has the same effect.
    pub fn unmount(self) {}
}

/// Periodic `touch()` tied to a mount. Aborted on drop.
#[derive(Debug)]
pub struct ActivityRefresher {
    handle: JoinHandle<()>,
}

impl ActivityRefresher {
    pub fn spawn(validator: SessionValidator) -> Option<Self> {
        let rt = match tokio::runtime::Handle::try_current() {
            Ok(rt) => rt,
            Err(_) => {
                tracing::warn!(target: "guard", "no async runtime; activity refresh disabled for this view");
                return None;
            }
        };
        let period = validator.policy().touch_interval.max(Duration::from_millis(1));
        let handle = rt.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !validator.touch() {
                    tracing::debug!(target: "guard", "activity refresh found no valid session");
                }
            }
        });
        Some(Self { handle })
    }
}

impl Drop for ActivityRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
