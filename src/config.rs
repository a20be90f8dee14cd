//! Runtime configuration from `TESOURARIA_*` environment variables.
//! Unset or unparsable values fall back to defaults.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::identity::{DefaultAdmin, SessionPolicy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub http_port: u16,
    /// JSON snapshot for the resource store; in-memory only when unset.
    pub data_file: Option<PathBuf>,
    pub session: SessionPolicy,
    pub default_admin: DefaultAdmin,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            http_port: 8080,
            data_file: None,
            session: SessionPolicy::default(),
            default_admin: DefaultAdmin::default(),
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let mut cfg = AppConfig::default();
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("TESOURARIA_BIND") { cfg.bind = v; }
        if let Some(p) = non_empty("TESOURARIA_HTTP_PORT").and_then(|v| v.parse::<u16>().ok()) { cfg.http_port = p; }
        // TESOURARIA_PERSIST=false forces in-memory even when a data file is set
        let persist = non_empty("TESOURARIA_PERSIST").and_then(|v| parse_bool(&v)).unwrap_or(true);
        if persist {
            cfg.data_file = non_empty("TESOURARIA_DATA_FILE").map(PathBuf::from);
        }

        if let Some(m) = non_empty("TESOURARIA_SESSION_STALE_MINUTES").and_then(|v| v.parse::<i64>().ok()).filter(|m| *m > 0) {
            match Duration::try_minutes(m) {
                Some(d) => cfg.session.staleness = d,
                None => tracing::warn!(target: "config", "TESOURARIA_SESSION_STALE_MINUTES={} out of range; using default", m),
            }
        }
        if let Some(h) = non_empty("TESOURARIA_SESSION_MAX_AGE_HOURS").and_then(|v| v.parse::<i64>().ok()).filter(|h| *h > 0) {
            match Duration::try_hours(h) {
                Some(d) => cfg.session.max_age = d,
                None => tracing::warn!(target: "config", "TESOURARIA_SESSION_MAX_AGE_HOURS={} out of range; using default", h),
            }
        }
        if let Some(s) = non_empty("TESOURARIA_SESSION_TOUCH_SECS").and_then(|v| v.parse::<u64>().ok()).filter(|s| *s > 0) {
            cfg.session.touch_interval = StdDuration::from_secs(s);
        }

        if let Some(v) = non_empty("TESOURARIA_ADMIN_EMAIL") { cfg.default_admin.email = v; }
        if let Some(v) = non_empty("TESOURARIA_ADMIN_NAME") { cfg.default_admin.name = v; }
        if let Some(v) = get("TESOURARIA_ADMIN_PASSWORD").filter(|v| !v.is_empty()) { cfg.default_admin.password = v; }
        cfg
    }
}
