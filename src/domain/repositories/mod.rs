//! Repository traits for the domain layer
//!
//! `RepositoryProvider` gives unified access to all per-aggregate repositories.

use super::audit::AuditLogRepository;
use super::ip_policy::IpPolicyRepository;
use super::revocation::RevocationRepository;
use super::session::SessionRepository;
use super::user::UserRepository;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let revoked = repos.revocations().contains(token).await?;
///     let touched = repos.sessions().touch(token, Utc::now()).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn revocations(&self) -> &dyn RevocationRepository;
    fn sessions(&self) -> &dyn SessionRepository;
    fn ip_policies(&self) -> &dyn IpPolicyRepository;
    fn audit_logs(&self) -> &dyn AuditLogRepository;
}
