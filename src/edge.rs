//! Edge request filter.
//!
//! Runs before any page handler and tags the request as public, protected or
//! unlisted. It cannot see the session (that lives in client storage, never in
//! a cookie), so it authorizes nothing: every request passes through and the
//! route guard on the client does the real enforcement. A path on the protected
//! list is therefore reachable here without a session; that is a known boundary
//! of this layer.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

use crate::routes::{path_has_prefix, AUTH_API_PREFIX, LOGIN_PATH, PASSWORD_RECOVERY_PATH, PROTECTED_SECTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    Public,
    Protected,
    Unlisted,
}

pub fn classify(path: &str) -> RouteClass {
    if path_has_prefix(path, LOGIN_PATH)
        || path_has_prefix(path, PASSWORD_RECOVERY_PATH)
        || path_has_prefix(path, AUTH_API_PREFIX)
    {
        return RouteClass::Public;
    }
    if PROTECTED_SECTIONS.iter().any(|s| path_has_prefix(path, s)) {
        return RouteClass::Protected;
    }
    RouteClass::Unlisted
}

/// axum middleware: attach the [`RouteClass`] and continue unconditionally.
pub async fn edge_filter(mut req: Request, next: Next) -> Response {
    let class = classify(req.uri().path());
    tracing::debug!(target: "edge", path = %req.uri().path(), class = ?class, "request classified");
    req.extensions_mut().insert(class);
    next.run(req).await
}
