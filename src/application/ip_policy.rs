//! IP allow-list / block-list administration and statistics

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ip_policy::DEFAULT_BLOCK_REASON;
use crate::domain::{
    canonical_ip, AllowedIp, BlockedIp, DomainError, DomainResult, NewAllowedIp, NewBlockedIp,
    RepositoryProvider,
};

use super::audit::AuditTrail;

const TOP_IPS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpCount {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub login_count: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityStats {
    pub allowed_ips: u64,
    pub blocked_ips: u64,
    pub country_distribution: Vec<CountryCount>,
    pub top_ips: Vec<IpCount>,
}

#[derive(Clone)]
pub struct IpPolicyService {
    repos: Arc<dyn RepositoryProvider>,
    audit: AuditTrail,
}

impl IpPolicyService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, audit: AuditTrail) -> Self {
        Self { repos, audit }
    }

    pub async fn list_allowed(&self) -> DomainResult<Vec<AllowedIp>> {
        self.repos.ip_policies().list_allowed().await
    }

    pub async fn allow(
        &self,
        ip: &str,
        country: Option<String>,
        description: Option<String>,
        actor: &str,
    ) -> DomainResult<AllowedIp> {
        let ip = canonical_ip(ip)?;
        let entry = self
            .repos
            .ip_policies()
            .add_allowed(NewAllowedIp {
                ip_address: ip.clone(),
                country,
                description,
            })
            .await
            .map_err(|e| match e {
                DomainError::Conflict(_) => {
                    DomainError::Conflict(format!("IP address {} is already allow-listed", ip))
                }
                other => other,
            })?;

        info!(ip = %ip, actor = %actor, "IP added to allow-list");
        self.audit
            .info(format!("IP {} added to allow-list by {}", ip, actor), Some(actor), Some(&ip))
            .await;
        Ok(entry)
    }

    pub async fn remove_allowed(&self, id: i32, actor: &str) -> DomainResult<()> {
        if !self.repos.ip_policies().remove_allowed(id).await? {
            return Err(DomainError::not_found("AllowedIp", "id", id.to_string()));
        }
        self.audit
            .info(format!("Allow-list entry {} removed by {}", id, actor), Some(actor), None)
            .await;
        Ok(())
    }

    pub async fn list_blocked(&self) -> DomainResult<Vec<BlockedIp>> {
        self.repos.ip_policies().list_blocked().await
    }

    pub async fn block(&self, ip: &str, reason: Option<String>, actor: &str) -> DomainResult<BlockedIp> {
        let ip = canonical_ip(ip)?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_BLOCK_REASON.to_string());

        let entry = self
            .repos
            .ip_policies()
            .add_blocked(NewBlockedIp {
                ip_address: ip.clone(),
                reason: reason.clone(),
                blocked_by: Some(actor.to_string()),
            })
            .await
            .map_err(|e| match e {
                DomainError::Conflict(_) => {
                    DomainError::Conflict(format!("IP address {} is already blocked", ip))
                }
                other => other,
            })?;

        warn!(ip = %ip, actor = %actor, reason = %reason, "IP blocked");
        self.audit
            .warn(format!("IP {} blocked by {}: {}", ip, actor, reason), Some(actor), Some(&ip))
            .await;
        Ok(entry)
    }

    pub async fn unblock(&self, id: i32, actor: &str) -> DomainResult<()> {
        let policies = self.repos.ip_policies();
        let entry = policies
            .find_blocked(id)
            .await?
            .ok_or_else(|| DomainError::not_found("BlockedIp", "id", id.to_string()))?;
        if !policies.remove_blocked(id).await? {
            return Err(DomainError::not_found("BlockedIp", "id", id.to_string()));
        }

        info!(ip = %entry.ip_address, actor = %actor, "IP unblocked");
        self.audit
            .info(
                format!("IP {} unblocked by {}", entry.ip_address, actor),
                Some(actor),
                Some(&entry.ip_address),
            )
            .await;
        Ok(())
    }

    /// Policy table sizes plus the origin of live sessions.
    pub async fn stats(&self) -> DomainResult<SecurityStats> {
        let policies = self.repos.ip_policies();
        let allowed_ips = policies.count_allowed().await?;
        let blocked_ips = policies.count_blocked().await?;
        let sessions = self.repos.sessions().list_active().await?;

        let mut countries: HashMap<String, u64> = HashMap::new();
        let mut ips: HashMap<String, IpCount> = HashMap::new();
        for session in sessions {
            *countries.entry(session.geo.country.clone()).or_default() += 1;
            ips.entry(session.ip_address.clone())
                .or_insert_with(|| IpCount {
                    ip: session.ip_address.clone(),
                    country: session.geo.country.clone(),
                    city: session.geo.city.clone(),
                    login_count: 0,
                })
                .login_count += 1;
        }

        let mut country_distribution: Vec<CountryCount> = countries
            .into_iter()
            .map(|(country, count)| CountryCount { country, count })
            .collect();
        country_distribution.sort_by(|a, b| b.count.cmp(&a.count).then(a.country.cmp(&b.country)));

        let mut top_ips: Vec<IpCount> = ips.into_values().collect();
        top_ips.sort_by(|a, b| b.login_count.cmp(&a.login_count).then(a.ip.cmp(&b.ip)));
        top_ips.truncate(TOP_IPS);

        Ok(SecurityStats {
            allowed_ips,
            blocked_ips,
            country_distribution,
            top_ips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{client, services_with_user};
    use crate::domain::AccessDecision;

    #[tokio::test]
    async fn block_takes_precedence_over_allow() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        svc.ip_policy.allow("10.0.0.5", None, None, "Admin").await.unwrap();
        assert_eq!(svc.gate.evaluate("10.0.0.5").await.unwrap(), AccessDecision::Admit);
        assert_eq!(
            svc.gate.evaluate("10.0.0.6").await.unwrap(),
            AccessDecision::NotAllowListed
        );

        svc.ip_policy.block("10.0.0.5", Some("test".into()), "Admin").await.unwrap();
        assert_eq!(svc.gate.evaluate("10.0.0.5").await.unwrap(), AccessDecision::Blocked);
        assert!(matches!(
            svc.gate.admit("::ffff:10.0.0.5").await,
            Err(DomainError::PolicyDenied { .. })
        ));
    }

    #[tokio::test]
    async fn duplicates_conflict_and_missing_ids_are_not_found() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let entry = svc.ip_policy.block("10.0.0.5", None, "Admin").await.unwrap();
        assert_eq!(entry.reason, DEFAULT_BLOCK_REASON);
        assert_eq!(entry.blocked_by.as_deref(), Some("Admin"));

        let dup = svc.ip_policy.block("10.0.0.5", None, "Admin").await.unwrap_err();
        assert!(matches!(dup, DomainError::Conflict(_)));
        let bad = svc.ip_policy.block("not-an-ip", None, "Admin").await.unwrap_err();
        assert!(matches!(bad, DomainError::Validation(_)));

        svc.ip_policy.unblock(entry.id, "Admin").await.unwrap();
        let gone = svc.ip_policy.unblock(entry.id, "Admin").await.unwrap_err();
        assert!(matches!(gone, DomainError::NotFound { .. }));
        let gone = svc.ip_policy.remove_allowed(42, "Admin").await.unwrap_err();
        assert!(matches!(gone, DomainError::NotFound { .. }));
        assert_eq!(svc.gate.evaluate("10.0.0.5").await.unwrap(), AccessDecision::Admit);
    }

    #[tokio::test]
    async fn stats_aggregate_live_sessions() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();
        svc.lifecycle.login("Admin", "Admin", &client()).await.unwrap();
        svc.ip_policy.block("10.9.9.9", None, "Admin").await.unwrap();

        let stats = svc.ip_policy.stats().await.unwrap();
        assert_eq!(stats.allowed_ips, 0);
        assert_eq!(stats.blocked_ips, 1);
        assert_eq!(stats.top_ips.len(), 1);
        assert_eq!(stats.top_ips[0].login_count, 2);
        assert_eq!(stats.country_distribution[0].country, "Unknown");
    }
}
