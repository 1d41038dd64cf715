//! Session domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserTag;

pub const UNKNOWN: &str = "Unknown";

/// Best-effort coarse location of a source IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
}

impl Default for GeoLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl GeoLocation {
    pub fn unknown() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            timezone: UNKNOWN.to_string(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.country != UNKNOWN
    }

    /// "city, country"
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: i32,
    pub username: String,
    pub token: String,
    pub ip_address: String,
    pub geo: GeoLocation,
    pub user_agent: String,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub username: String,
    pub token: String,
    pub ip_address: String,
    pub user_agent: String,
    pub geo: GeoLocation,
}

/// Which live sessions a deactivation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeactivateCriteria {
    /// The session bound to one token
    Token(String),
    /// Every live session of one user
    User(String),
    /// Every live session except those of the bootstrap account
    AllExceptBootstrap,
    /// Live sessions whose last activity is strictly older than the cutoff
    StaleBefore(DateTime<Utc>),
}

impl DeactivateCriteria {
    /// Label used for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Token(_) => "logout",
            Self::User(_) => "forced_logout",
            Self::AllExceptBootstrap => "logout_all",
            Self::StaleBefore(_) => "stale",
        }
    }
}

/// Latest live session of a user, joined with the owning account
#[derive(Debug, Clone)]
pub struct ActiveSessionView {
    pub session: Session,
    pub user_id: i32,
    pub tag: Option<UserTag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_defaults() {
        let geo = GeoLocation::default();
        assert!(!geo.is_known());
        assert_eq!(geo.label(), "Unknown, Unknown");
    }
}
