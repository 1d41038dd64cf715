//! User domain entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

/// Binary role: admin or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Standard,
}

impl UserRole {
    pub fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Self::Admin
        } else {
            Self::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Standard => "standard",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team tag assigned to non-bootstrap accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserTag {
    RZ,
    LB,
    KR,
}

impl UserTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RZ => "RZ",
            Self::LB => "LB",
            Self::KR => "KR",
        }
    }
}

impl fmt::Display for UserTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RZ" => Ok(Self::RZ),
            "LB" => Ok(Self::LB),
            "KR" => Ok(Self::KR),
            other => Err(DomainError::Validation(format!(
                "Invalid tag '{}'. Must be RZ, LB, or KR",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub tag: Option<UserTag>,
    /// The single non-deletable, non-demotable account
    pub is_bootstrap: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_parsing_is_exact() {
        assert_eq!("RZ".parse::<UserTag>().unwrap(), UserTag::RZ);
        assert_eq!("KR".parse::<UserTag>().unwrap(), UserTag::KR);
        assert!("rz".parse::<UserTag>().is_err());
        assert!("XX".parse::<UserTag>().is_err());
    }

    #[test]
    fn role_from_flag() {
        assert_eq!(UserRole::from_admin_flag(true), UserRole::Admin);
        assert_eq!(UserRole::from_admin_flag(false), UserRole::Standard);
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }
}
