use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::shared::{DomainError, DomainResult};

pub const DEFAULT_BLOCK_REASON: &str = "Blocked by administrator";

#[derive(Debug, Clone)]
pub struct AllowedIp {
    pub id: i32,
    pub ip_address: String,
    pub country: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewAllowedIp {
    pub ip_address: String,
    pub country: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlockedIp {
    pub id: i32,
    pub ip_address: String,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
    pub blocked_by: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewBlockedIp {
    pub ip_address: String,
    pub reason: String,
    pub blocked_by: Option<String>,
}

/// Outcome of the gate for one source address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Admit,
    Blocked,
    NotAllowListed,
}

impl AccessDecision {
    /// Evaluate table lookups. Block always wins; an empty allow-list
    /// imposes no restriction.
    pub fn evaluate(blocked: bool, allow_list_len: u64, allowed: bool) -> Self {
        if blocked {
            Self::Blocked
        } else if allow_list_len > 0 && !allowed {
            Self::NotAllowListed
        } else {
            Self::Admit
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Admit => None,
            Self::Blocked => Some("blocked"),
            Self::NotAllowListed => Some("not_allow_listed"),
        }
    }
}

/// Parse and canonicalise an address; IPv4-mapped IPv6 folds to IPv4.
pub fn canonical_ip(raw: &str) -> DomainResult<String> {
    let ip: IpAddr = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::Validation(format!("Invalid IP address: {}", raw)))?;
    Ok(ip.to_canonical().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_wins_over_allow() {
        assert_eq!(AccessDecision::evaluate(true, 1, true), AccessDecision::Blocked);
        assert_eq!(AccessDecision::evaluate(true, 0, false), AccessDecision::Blocked);
    }

    #[test]
    fn empty_allow_list_is_open() {
        assert_eq!(AccessDecision::evaluate(false, 0, false), AccessDecision::Admit);
        assert_eq!(
            AccessDecision::evaluate(false, 2, false),
            AccessDecision::NotAllowListed
        );
        assert_eq!(AccessDecision::evaluate(false, 2, true), AccessDecision::Admit);
    }

    #[test]
    fn canonicalises_mapped_addresses() {
        assert_eq!(canonical_ip("::ffff:10.0.0.5").unwrap(), "10.0.0.5");
        assert_eq!(canonical_ip(" 192.168.1.1 ").unwrap(), "192.168.1.1");
        assert_eq!(canonical_ip("2001:db8::1").unwrap(), "2001:db8::1");
        assert!(canonical_ip("10.0.0.256").is_err());
        assert!(canonical_ip("localhost").is_err());
    }
}
