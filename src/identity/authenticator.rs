use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::persistence::{NewUser, StoreError, UserRepository};

use super::clock::Clock;
use super::password::{hash_password, verify_dummy, verify_password};
use super::store::SessionStore;
use super::{normalize_email, Role, Session, User};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Identity created when the `users` table is empty.
#[derive(Clone)]
pub struct DefaultAdmin {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl Default for DefaultAdmin {
    fn default() -> Self {
        Self { email: "admin@igreja.local".into(), name: "Administrador".into(), password: "admin123".into() }
    }
}

impl std::fmt::Debug for DefaultAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAdmin").field("email", &self.email).field("name", &self.name).finish_non_exhaustive()
    }
}

/// Verifies credentials against the `users` table and establishes sessions.
#[derive(Clone)]
pub struct Authenticator {
    users: UserRepository,
    clock: Arc<dyn Clock>,
    default_admin: DefaultAdmin,
}

impl Authenticator {
    pub fn new(users: UserRepository, clock: Arc<dyn Clock>, default_admin: DefaultAdmin) -> Self {
        Self { users, clock, default_admin }
    }

    /// `Ok(None)` for unknown email, inactive account or wrong password alike.
    /// Persistence failures are `Err`.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<Option<User>> {
        let key = normalize_email(email);
        let Some(record) = self.users.get_user_by_email(&key).await? else {
            verify_dummy(password);
            tracing::debug!(target: "auth", email = %key, reason = "unknown_email", "authentication failed");
            return Ok(None);
        };
        // inactive and mismatched accounts both cost one verification
        let matches = verify_password(&record.password_hash, password);
        if !record.active {
            tracing::debug!(target: "auth", user = %record.id, reason = "inactive", "authentication failed");
            return Ok(None);
        }
        if !matches {
            tracing::debug!(target: "auth", user = %record.id, reason = "password_mismatch", "authentication failed");
            return Ok(None);
        }
        Ok(Some(record.to_user()))
    }

    /// Authenticate and persist a fresh session.
    pub async fn sign_in(&self, store: &SessionStore, email: &str, password: &str) -> AppResult<Session> {
        let user = self.authenticate(email, password).await?.ok_or_else(AppError::invalid_credentials)?;
        let session = Session::issue(user, self.clock.now());
        store.save(&session);
        tracing::info!(target: "auth", user = %session.user.id, role = %session.user.role, "signed in");
        Ok(session)
    }

    /// Create the configured administrator when no identity exists. Returns
    /// whether one was created; repeated calls are no-ops.
    pub async fn ensure_default_administrator(&self) -> AppResult<bool> {
        if self.users.count().await? > 0 {
            return Ok(false);
        }
        let admin = &self.default_admin;
        let hash = hash_password(&admin.password)?;
        let new = NewUser { email: admin.email.clone(), name: admin.name.clone(), role: Role::Admin };
        match self.users.insert(new, hash, self.clock.now()).await {
            Ok(rec) => {
                tracing::warn!(target: "auth", email = %rec.email, "created default administrator; change its password");
                Ok(true)
            }
            // lost a race with a concurrent bootstrap
            Err(StoreError::DuplicateUnique { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn change_password(&self, email: &str, current: &str, new_password: &str) -> AppResult<()> {
        check_password_policy(new_password)?;
        let Some(user) = self.authenticate(email, current).await? else {
            return Err(AppError::invalid_credentials());
        };
        let hash = hash_password(new_password)?;
        if !self.users.update_password(&user.id, hash, self.clock.now()).await? {
            return Err(AppError::not_found("user_not_found", "Usuário não encontrado"));
        }
        tracing::info!(target: "auth", user = %user.id, "password changed");
        Ok(())
    }

    pub async fn create_user(&self, new: NewUser, password: &str) -> AppResult<User> {
        check_password_policy(password)?;
        let hash = hash_password(password)?;
        let rec = self.users.insert(new, hash, self.clock.now()).await?;
        tracing::info!(target: "auth", user = %rec.id, role = %rec.role, "user created");
        Ok(rec.to_user())
    }

    pub async fn set_active(&self, email: &str, active: bool) -> AppResult<()> {
        let Some(rec) = self.users.get_user_by_email(email).await? else {
            return Err(AppError::not_found("user_not_found", "Usuário não encontrado"));
        };
        self.users.set_active(&rec.id, active, self.clock.now()).await?;
        tracing::info!(target: "auth", user = %rec.id, active = active, "account status changed");
        Ok(())
    }
}

fn check_password_policy(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::user(
            "weak_password".to_string(),
            format!("A senha deve ter pelo menos {} caracteres", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::clock::SystemClock;
    use crate::identity::storage::MemoryStorage;
    use crate::persistence::{MemoryResourceStore, UnconfiguredStore};

    fn auth() -> Authenticator {
        let users = UserRepository::new(Arc::new(MemoryResourceStore::new()));
        Authenticator::new(users, Arc::new(SystemClock), DefaultAdmin::default())
    }

    #[tokio::test]
    async fn default_administrator_is_created_once() {
        let a = auth();
        assert!(a.ensure_default_administrator().await.unwrap());
        assert!(!a.ensure_default_administrator().await.unwrap());
        assert_eq!(a.users.count().await.unwrap(), 1);
        let admin = a.authenticate("ADMIN@igreja.local", "admin123").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn no_bootstrap_when_users_exist() {
        let a = auth();
        let new = NewUser { email: "pastor@igreja.org".into(), name: "Pr. João".into(), role: Role::Pastor };
        a.create_user(new, "segredo1").await.unwrap();
        assert!(!a.ensure_default_administrator().await.unwrap());
        assert!(a.authenticate("admin@igreja.local", "admin123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_email_is_absent_not_error() {
        let a = auth();
        assert!(a.authenticate("unknown@x.com", "any").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_password_and_inactive_are_absent() {
        let a = auth();
        a.ensure_default_administrator().await.unwrap();
        assert!(a.authenticate("admin@igreja.local", "wrong").await.unwrap().is_none());
        a.set_active("admin@igreja.local", false).await.unwrap();
        assert!(a.authenticate("admin@igreja.local", "admin123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_failure_message_is_uniform() {
        let a = auth();
        a.ensure_default_administrator().await.unwrap();
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let unknown = a.sign_in(&store, "nobody@igreja.local", "admin123").await.unwrap_err();
        let wrong = a.sign_in(&store, "admin@igreja.local", "nope").await.unwrap_err();
        assert_eq!(unknown, wrong);
        assert!(store.load().is_none());

        let s = a.sign_in(&store, "admin@igreja.local", "admin123").await.unwrap();
        assert_eq!(store.load(), Some(s));
    }

    #[tokio::test]
    async fn change_password_requires_current_one() {
        let a = auth();
        a.ensure_default_administrator().await.unwrap();
        let err = a.change_password("admin@igreja.local", "bad", "novasenha").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials { .. }));
        let err = a.change_password("admin@igreja.local", "admin123", "123").await.unwrap_err();
        assert!(matches!(err, AppError::UserInput { .. }));

        a.change_password("admin@igreja.local", "admin123", "novasenha").await.unwrap();
        assert!(a.authenticate("admin@igreja.local", "admin123").await.unwrap().is_none());
        assert!(a.authenticate("admin@igreja.local", "novasenha").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_email_surfaces_as_duplicate_unique() {
        let a = auth();
        let new = NewUser { email: "sec@igreja.org".into(), name: "Sec".into(), role: Role::Secretaria };
        a.create_user(new.clone(), "segredo1").await.unwrap();
        let err = a.create_user(new, "segredo2").await.unwrap_err();
        assert_eq!(err.http_status(), 409);
    }

    #[tokio::test]
    async fn unconfigured_backend_is_an_error() {
        let users = UserRepository::new(Arc::new(UnconfiguredStore));
        let a = Authenticator::new(users, Arc::new(SystemClock), DefaultAdmin::default());
        let err = a.authenticate("a@b.c", "x").await.unwrap_err();
        assert!(matches!(err, AppError::NotConfigured { .. }));
    }
}
