//!
//! tesouraria HTTP shell
//! ---------------------
//! axum router serving the login API and the page routes of the application.
//!
//! Responsibilities:
//! - Credential check endpoint returning the user and a fresh session for the
//!   client to store; the server keeps no session state and sets no cookies.
//! - Password change endpoint.
//! - Page routes answered with a minimal HTML shell (views render client-side).
//! - Every request passes through the edge filter first.
//! - Default administrator bootstrap on startup.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::edge::{classify, edge_filter, RouteClass};
use crate::error::AppError;
use crate::identity::{Authenticator, Clock, Session, SystemClock};
use crate::persistence::{MemoryResourceStore, ResourceStore, UserRepository};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Authenticator,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
}

pub fn error_response(e: &AppError) -> Response {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "status": "error", "error": e }))).into_response()
}

/// Open the configured resource store and bootstrap the administrator.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let mem = match cfg.data_file.as_ref() {
        Some(path) => MemoryResourceStore::open(path)
            .with_context(|| format!("While opening data file {}", path.display()))?,
        None => {
            tracing::warn!(target: "startup", "TESOURARIA_DATA_FILE unset; data lives in memory only");
            MemoryResourceStore::new()
        }
    };
    let store: Arc<dyn ResourceStore> = Arc::new(mem);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let auth = Authenticator::new(UserRepository::new(store), clock.clone(), cfg.default_admin.clone());
    auth.ensure_default_administrator()
        .await
        .map_err(|e| anyhow::anyhow!("While ensuring default administrator: {e}"))?;
    Ok(AppState { auth, clock })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "tesouraria ok" }))
        .route("/api/auth/login", post(login))
        .route("/api/auth/password", post(change_password))
        .fallback(page_shell)
        .layer(axum::middleware::from_fn(edge_filter))
        .with_state(state)
}

pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "tesouraria starting: bind={} port={} data_file={:?} staleness_min={} max_age_h={} touch_secs={}",
        cfg.bind, cfg.http_port, cfg.data_file,
        cfg.session.staleness.num_minutes(), cfg.session.max_age.num_hours(), cfg.session.touch_interval.as_secs()
    );
    let state = build_state(&cfg).await?;
    let addr: SocketAddr = format!("{}:{}", cfg.bind, cfg.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cfg.bind, cfg.http_port))?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> Response {
    match state.auth.authenticate(&payload.email, &payload.password).await {
        Ok(Some(user)) => {
            let session = Session::issue(user, state.clock.now());
            info!(target: "auth", user = %session.user.id, "login ok");
            (StatusCode::OK, Json(json!({ "status": "ok", "user": session.user, "session": session }))).into_response()
        }
        Ok(None) => error_response(&AppError::invalid_credentials()),
        Err(e) => {
            error!("login error: {e}");
            error_response(&e)
        }
    }
}

async fn change_password(State(state): State<AppState>, Json(p): Json<ChangePasswordPayload>) -> Response {
    match state.auth.change_password(&p.email, &p.current_password, &p.new_password).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

async fn page_shell(req: Request) -> Response {
    let path = req.uri().path().to_string();
    let class = req.extensions().get::<RouteClass>().copied().unwrap_or_else(|| classify(&path));
    if class == RouteClass::Unlisted && path != "/" {
        return (StatusCode::NOT_FOUND, Html("<!doctype html><title>404</title><p>Página não encontrada</p>".to_string()))
            .into_response();
    }
    let class_name = match class {
        RouteClass::Public => "public",
        RouteClass::Protected => "protected",
        RouteClass::Unlisted => "unlisted",
    };
    Html(format!(
        "<!doctype html><html lang=\"pt-BR\"><head><meta charset=\"utf-8\"><title>Tesouraria</title></head>\
         <body data-route=\"{}\" data-route-class=\"{}\"><div id=\"app\"></div></body></html>",
        html_escape(&path), class_name
    ))
    .into_response()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_uses_mapped_status() {
        assert_eq!(error_response(&AppError::invalid_credentials()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_response(&AppError::persistence()).status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn escapes_markup_in_paths() {
        assert_eq!(html_escape("/x\"><script>"), "/x&quot;&gt;&lt;script&gt;");
    }

    #[tokio::test]
    async fn build_state_bootstraps_admin_in_memory() {
        let state = build_state(&AppConfig::default()).await.unwrap();
        let admin = state.auth.authenticate("admin@igreja.local", "admin123").await.unwrap();
        assert!(admin.is_some());
    }
}
