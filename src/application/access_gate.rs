//! Access gate: IP block-list / allow-list policy.
//!
//! Evaluated ahead of authentication on every request. Block entries are
//! checked first and win over allow entries; an empty allow-list imposes
//! no restriction.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{canonical_ip, AccessDecision, GeoLocation, RepositoryProvider};
use crate::infrastructure::geo::GeoLocator;
use crate::shared::{DomainError, DomainResult};

use super::audit::AuditTrail;

#[derive(Clone)]
pub struct AccessGate {
    repos: Arc<dyn RepositoryProvider>,
    geo: Arc<dyn GeoLocator>,
    audit: AuditTrail,
}

impl AccessGate {
    pub fn new(repos: Arc<dyn RepositoryProvider>, geo: Arc<dyn GeoLocator>, audit: AuditTrail) -> Self {
        Self { repos, geo, audit }
    }

    /// Storage errors propagate so the caller can deny.
    pub async fn evaluate(&self, ip: &str) -> DomainResult<AccessDecision> {
        let policies = self.repos.ip_policies();
        let ip = canonical_ip(ip).unwrap_or_else(|_| ip.to_string());

        if policies.is_blocked(&ip).await? {
            return Ok(AccessDecision::Blocked);
        }
        let allow_list_len = policies.count_allowed().await?;
        let allowed = allow_list_len > 0 && policies.is_allowed(&ip).await?;
        Ok(AccessDecision::evaluate(false, allow_list_len, allowed))
    }

    /// Admit or fail with `PolicyDenied`. Denials are audited.
    pub async fn admit(&self, ip: &str) -> DomainResult<()> {
        let decision = self.evaluate(ip).await?;
        let Some(reason) = decision.reason() else {
            return Ok(());
        };

        metrics::counter!("access_gate_denied_total", "reason" => reason).increment(1);
        let (message, audit_message) = match decision {
            AccessDecision::Blocked => ("IP address is blocked", format!("Blocked IP attempt: {}", ip)),
            _ => (
                "IP address is not in the allow-list",
                format!("Unauthorized IP attempt: {}", ip),
            ),
        };
        warn!(ip = %ip, reason, "Request rejected by access gate");
        self.audit.warn(audit_message, None, Some(ip)).await;

        Err(DomainError::PolicyDenied {
            reason: message.to_string(),
            ip: ip.to_string(),
        })
    }

    /// Cached location for `ip`; never performs a lookup.
    pub fn known_location(&self, ip: &str) -> Option<GeoLocation> {
        self.geo.cached(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::services_with_user;
    use crate::infrastructure::database::SeaOrmRepositoryProvider;
    use crate::infrastructure::geo::StaticGeoLocator;

    #[tokio::test]
    async fn empty_policy_admits_everyone() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        assert_eq!(svc.gate.evaluate("203.0.113.9").await.unwrap(), AccessDecision::Admit);
        assert!(svc.gate.admit("10.0.0.5").await.is_ok());
    }

    #[tokio::test]
    async fn block_beats_allow_and_allow_list_excludes_others() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        svc.ip_policy.allow("10.0.0.5", None, None, "Admin").await.unwrap();
        svc.ip_policy.block("10.0.0.5", Some("test".into()), "Admin").await.unwrap();

        assert_eq!(svc.gate.evaluate("10.0.0.5").await.unwrap(), AccessDecision::Blocked);
        assert_eq!(svc.gate.evaluate("10.0.0.6").await.unwrap(), AccessDecision::NotAllowListed);

        match svc.gate.admit("::ffff:10.0.0.5").await {
            Err(DomainError::PolicyDenied { reason, .. }) => assert_eq!(reason, "IP address is blocked"),
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn storage_failure_denies() {
        let (svc, db) = services_with_user("alice", "secret1", false).await;
        db.close().await.unwrap();
        assert!(svc.gate.admit("10.0.0.5").await.is_err());
    }

    #[tokio::test]
    async fn known_location_comes_from_cache_only() {
        let (svc, db) = services_with_user("alice", "secret1", false).await;
        let berlin = GeoLocation {
            country: "Germany".into(),
            city: "Berlin".into(),
            region: "Berlin".into(),
            timezone: "Europe/Berlin".into(),
        };
        let gate = AccessGate::new(
            Arc::new(SeaOrmRepositoryProvider::new(db)),
            Arc::new(StaticGeoLocator::new().with("203.0.113.9", berlin.clone())),
            svc.audit.clone(),
        );
        assert_eq!(gate.known_location("203.0.113.9"), Some(berlin));
        assert_eq!(gate.known_location("203.0.113.10"), None);
    }
}
