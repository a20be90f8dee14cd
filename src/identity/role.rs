use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of application roles. Serialized lowercase, as stored in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Tesouraria,
    Secretaria,
    Pastor,
    Auditor,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Admin, Role::Tesouraria, Role::Secretaria, Role::Pastor, Role::Auditor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Tesouraria => "tesouraria",
            Role::Secretaria => "secretaria",
            Role::Pastor => "pastor",
            Role::Auditor => "auditor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "tesouraria" => Ok(Role::Tesouraria),
            "secretaria" => Ok(Role::Secretaria),
            "pastor" => Ok(Role::Pastor),
            "auditor" => Ok(Role::Auditor),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_closed() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Secretaria ".parse::<Role>().unwrap(), Role::Secretaria);
        assert!("tesoureiro".parse::<Role>().is_err());
        for r in Role::ALL {
            assert_eq!(r.as_str().parse::<Role>().unwrap(), r);
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Tesouraria).unwrap(), "\"tesouraria\"");
        let r: Role = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(r, Role::Auditor);
        assert!(serde_json::from_str::<Role>("\"bispo\"").is_err());
    }
}
