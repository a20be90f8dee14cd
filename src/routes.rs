//! Application paths shared by the edge filter, the route guard and the login flow.

pub const LOGIN_PATH: &str = "/login";
pub const PASSWORD_RECOVERY_PATH: &str = "/recuperar-senha";
pub const AUTH_API_PREFIX: &str = "/api/auth";
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";
pub const REDIRECT_PARAM: &str = "redirect";

/// Top-level application sections; each covers its sub-paths too.
pub const PROTECTED_SECTIONS: &[&str] = &[
    "/dashboard",
    "/eventos",
    "/caixa",
    "/contas-a-pagar",
    "/membros",
    "/fornecedores",
    "/usuarios",
    "/relatorios",
    "/configuracoes",
];

/// True when `path` equals `prefix` or continues it with a `/`.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Login URL carrying `current` as the return destination.
pub fn login_redirect(current: &str) -> String {
    format!("{}?{}={}", LOGIN_PATH, REDIRECT_PARAM, urlencoding::encode(current))
}

/// Decoded `redirect` value from a raw query string (without the leading `?`).
pub fn redirect_param(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k != REDIRECT_PARAM { return None; }
        urlencoding::decode(&v.replace('+', " ")).ok().map(|s| s.into_owned())
    })
}

/// A same-origin absolute path: one leading `/`, no scheme or authority.
pub fn is_safe_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(|c| c.is_control())
}

/// Where to go after a successful login.
pub fn post_login_target(redirect: Option<&str>) -> String {
    match redirect.map(str::trim) {
        Some(t) if is_safe_local_path(t) && !path_has_prefix(path_only(t), LOGIN_PATH) => t.to_string(),
        _ => DEFAULT_LANDING_PATH.to_string(),
    }
}

/// `target` without its query string or fragment.
pub fn path_only(target: &str) -> &str {
    target.split(['?', '#']).next().unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching_respects_segments() {
        assert!(path_has_prefix("/caixa", "/caixa"));
        assert!(path_has_prefix("/caixa/novo", "/caixa"));
        assert!(!path_has_prefix("/caixas", "/caixa"));
        assert!(path_has_prefix("/api/auth/login", AUTH_API_PREFIX));
    }

    #[test]
    fn login_redirect_round_trips_through_query() {
        let target = "/contas-a-pagar?mes=2024-05&status=aberta";
        let url = login_redirect(target);
        assert!(url.starts_with("/login?redirect="));
        let query = url.split_once('?').unwrap().1;
        assert_eq!(redirect_param(query).as_deref(), Some(target));
    }

    #[test]
    fn post_login_target_rejects_foreign_destinations() {
        assert_eq!(post_login_target(None), DEFAULT_LANDING_PATH);
        assert_eq!(post_login_target(Some("/membros/42")), "/membros/42");
        assert_eq!(post_login_target(Some("https://evil.example")), DEFAULT_LANDING_PATH);
        assert_eq!(post_login_target(Some("//evil.example")), DEFAULT_LANDING_PATH);
        assert_eq!(post_login_target(Some("/login?redirect=/caixa")), DEFAULT_LANDING_PATH);
        assert_eq!(post_login_target(Some("")), DEFAULT_LANDING_PATH);
    }

    #[test]
    fn post_login_target_never_returns_to_login() {
        for t in ["/login", "/login/", "/login?redirect=/caixa", "/login#topo", " /login?x=1 "] {
            assert_eq!(post_login_target(Some(t)), DEFAULT_LANDING_PATH, "{t}");
        }
        assert_eq!(post_login_target(Some("/loginho")), "/loginho");
        assert_eq!(post_login_target(Some("/caixa?from=/login")), "/caixa?from=/login");
        assert_eq!(path_only("/eventos/7?aba=1#x"), "/eventos/7");
    }

    #[test]
    fn redirect_param_ignores_other_keys() {
        assert_eq!(redirect_param("a=1&b=2"), None);
        assert_eq!(redirect_param("a=1&redirect=%2Feventos").as_deref(), Some("/eventos"));
    }
}
