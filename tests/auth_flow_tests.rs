//! End-to-end client flow: bootstrap, login, guarded navigation, expiry, logout.
//! Storage is file-backed here to mirror a browser profile surviving reloads.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use tempfile::tempdir;

use tesouraria::client::ClientApp;
use tesouraria::error::AppError;
use tesouraria::identity::{
    Authenticator, DefaultAdmin, FileStorage, GuardState, ManualClock, MemoryStorage, Role, SessionPolicy, SESSION_KEY,
};
use tesouraria::identity::ClientStorage;
use tesouraria::persistence::{MemoryResourceStore, NewUser, UserRepository};
use tesouraria::routes::redirect_param;

fn authenticator(clock: &ManualClock) -> Authenticator {
    let users = UserRepository::new(Arc::new(MemoryResourceStore::new()));
    Authenticator::new(users, Arc::new(clock.clone()), DefaultAdmin::default())
}

#[tokio::test]
async fn login_returns_to_the_originally_requested_page() -> Result<()> {
    let tmp = tempdir()?;
    let clock = ManualClock::default();
    let auth = authenticator(&clock);
    auth.ensure_default_administrator().await?;
    let app = ClientApp::new(Arc::new(FileStorage::new(tmp.path())?), SessionPolicy::default(), Arc::new(clock.clone()));

    // not signed in: the guard sends us to login and remembers where we were
    let mount = app.open("/contas-a-pagar?status=aberta");
    let target = mount.state().redirect_target().expect("redirect").to_string();
    let query = target.strip_prefix("/login?").expect("login path");
    let redirect = redirect_param(query);
    assert_eq!(redirect.as_deref(), Some("/contas-a-pagar?status=aberta"));
    drop(mount);

    let next = app.login(&auth, "admin@igreja.local", "admin123", redirect.as_deref()).await?;
    assert_eq!(next, "/contas-a-pagar?status=aberta");

    let mount = app.open(&next);
    assert!(mount.state().is_authorized());
    assert!(mount.has_refresher());

    // a second app instance over the same profile sees the session (page reload)
    let reloaded = ClientApp::new(Arc::new(FileStorage::new(tmp.path())?), SessionPolicy::default(), Arc::new(clock.clone()));
    assert_eq!(reloaded.current_user().map(|u| u.role), Some(Role::Admin));
    Ok(())
}

#[tokio::test]
async fn role_restricted_section_sends_non_admin_to_dashboard() -> Result<()> {
    let clock = ManualClock::default();
    let auth = authenticator(&clock);
    auth.create_user(NewUser { email: "secretaria@igreja.org".into(), name: "Sec".into(), role: Role::Secretaria }, "segredo1").await?;
    let app = ClientApp::new(Arc::new(MemoryStorage::new()), SessionPolicy::default(), Arc::new(clock.clone()));

    let next = app.login(&auth, "Secretaria@Igreja.org", "segredo1", None).await?;
    assert_eq!(next, "/dashboard");

    let mount = app.open("/usuarios");
    assert_eq!(mount.state(), &GuardState::Redirecting { target: "/dashboard".into() });
    assert!(app.open("/membros").state().is_authorized());
    Ok(())
}

#[tokio::test]
async fn failed_login_leaves_no_session() -> Result<()> {
    let clock = ManualClock::default();
    let auth = authenticator(&clock);
    auth.ensure_default_administrator().await?;
    let app = ClientApp::new(Arc::new(MemoryStorage::new()), SessionPolicy::default(), Arc::new(clock.clone()));

    let err = app.login(&auth, "admin@igreja.local", "errada", Some("/caixa")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials { .. }));
    assert_eq!(err.http_status(), 401);
    assert!(app.current_user().is_none());
    Ok(())
}

#[tokio::test]
async fn focus_keeps_session_alive_until_max_age() -> Result<()> {
    let clock = ManualClock::default();
    let auth = authenticator(&clock);
    auth.ensure_default_administrator().await?;
    let app = ClientApp::new(Arc::new(MemoryStorage::new()), SessionPolicy::default(), Arc::new(clock.clone()));
    app.login(&auth, "admin@igreja.local", "admin123", None).await?;

    clock.advance(Duration::minutes(20));
    assert!(app.on_focus());
    clock.advance(Duration::minutes(20));
    assert!(app.record_activity());
    assert!(app.open("/eventos").state().is_authorized());

    // idle past the staleness threshold
    clock.advance(Duration::minutes(31));
    assert!(!app.on_focus());
    let mount = app.open("/eventos");
    assert_eq!(mount.state().redirect_target(), Some("/login?redirect=%2Feventos"));
    Ok(())
}

#[tokio::test]
async fn corrupted_storage_forces_login_without_panicking() -> Result<()> {
    let clock = ManualClock::default();
    let storage = MemoryStorage::new();
    let app = ClientApp::new(Arc::new(storage.clone()), SessionPolicy::default(), Arc::new(clock.clone()));
    storage.set_item(SESSION_KEY, "[1,2,3]")?;

    assert!(app.sessions().load().is_none());
    assert!(!app.on_focus());
    assert!(matches!(app.open("/dashboard").state(), GuardState::Redirecting { .. }));
    Ok(())
}

#[tokio::test]
async fn logout_clears_session() -> Result<()> {
    let clock = ManualClock::default();
    let auth = authenticator(&clock);
    auth.ensure_default_administrator().await?;
    let app = ClientApp::new(Arc::new(MemoryStorage::new()), SessionPolicy::default(), Arc::new(clock.clone()));
    app.login(&auth, "admin@igreja.local", "admin123", None).await?;
    assert!(app.current_user().is_some());

    app.logout();
    assert!(app.current_user().is_none());
    assert!(!app.open("/caixa").state().is_authorized());
    Ok(())
}
