use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// One authenticated browsing session, as persisted in client storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub issued_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    pub fn issue(user: User, now: DateTime<Utc>) -> Self {
        Self { user, issued_at: now, last_activity_at: now }
    }
}

/// Expiry rules and refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Maximum inactivity before the session is stale.
    pub staleness: Duration,
    /// Absolute lifetime counted from `issued_at`.
    pub max_age: Duration,
    /// Activity refresh period while a protected view is mounted.
    pub touch_interval: StdDuration,
    /// Tolerated amount of timestamps lying in the future.
    pub clock_skew: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            staleness: Duration::minutes(30),
            max_age: Duration::hours(8),
            touch_interval: StdDuration::from_secs(5 * 60),
            clock_skew: Duration::minutes(1),
        }
    }
}

impl SessionPolicy {
    pub fn check(&self, session: &Session, now: DateTime<Utc>) -> Result<(), Invalidity> {
        let horizon = now + self.clock_skew;
        if session.issued_at > horizon || session.last_activity_at > horizon {
            return Err(Invalidity::FromTheFuture);
        }
        if now - session.last_activity_at > self.staleness {
            return Err(Invalidity::Stale);
        }
        if now - session.issued_at > self.max_age {
            return Err(Invalidity::Expired);
        }
        Ok(())
    }
}

/// Why a present session is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidity {
    Stale,
    Expired,
    FromTheFuture,
}

impl Invalidity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Invalidity::Stale => "stale",
            Invalidity::Expired => "expired",
            Invalidity::FromTheFuture => "future_timestamp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn user() -> User {
        User { id: "u1".into(), email: "a@b.c".into(), name: "A".into(), role: Role::Admin }
    }

    #[test]
    fn serialized_form_uses_camel_case_timestamps() {
        let now = Utc::now();
        let s = Session::issue(user(), now);
        let v = serde_json::to_value(&s).unwrap();
        assert!(v.get("issuedAt").is_some());
        assert!(v.get("lastActivityAt").is_some());
        assert_eq!(v["user"]["role"], "admin");
    }

    #[test]
    fn policy_boundaries_are_inclusive() {
        let p = SessionPolicy::default();
        let t0 = Utc::now();
        let s = Session::issue(user(), t0);
        assert!(p.check(&s, t0 + Duration::minutes(30)).is_ok());
        assert_eq!(p.check(&s, t0 + Duration::minutes(30) + Duration::seconds(1)), Err(Invalidity::Stale));
    }

    #[test]
    fn max_age_applies_even_with_recent_activity() {
        let p = SessionPolicy::default();
        let t0 = Utc::now();
        let mut s = Session::issue(user(), t0);
        s.last_activity_at = t0 + Duration::hours(9);
        assert_eq!(p.check(&s, t0 + Duration::hours(9)), Err(Invalidity::Expired));
    }

    #[test]
    fn future_timestamps_beyond_skew_are_rejected() {
        let p = SessionPolicy::default();
        let now = Utc::now();
        let s = Session::issue(user(), now + Duration::seconds(30));
        assert!(p.check(&s, now).is_ok());
        let s = Session::issue(user(), now + Duration::hours(1));
        assert_eq!(p.check(&s, now), Err(Invalidity::FromTheFuture));
    }
}
