//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{
    AuditLogRepository, IpPolicyRepository, RepositoryProvider, RevocationRepository,
    SessionRepository, UserRepository,
};

use super::audit_log_repository::SeaOrmAuditLogRepository;
use super::ip_policy_repository::SeaOrmIpPolicyRepository;
use super::revocation_repository::SeaOrmRevocationRepository;
use super::session_repository::SeaOrmSessionRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    users: SeaOrmUserRepository,
    revocations: SeaOrmRevocationRepository,
    sessions: SeaOrmSessionRepository,
    ip_policies: SeaOrmIpPolicyRepository,
    audit_logs: SeaOrmAuditLogRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            revocations: SeaOrmRevocationRepository::new(db.clone()),
            sessions: SeaOrmSessionRepository::new(db.clone()),
            ip_policies: SeaOrmIpPolicyRepository::new(db.clone()),
            audit_logs: SeaOrmAuditLogRepository::new(db.clone()),
            db,
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn revocations(&self) -> &dyn RevocationRepository {
        &self.revocations
    }

    fn sessions(&self) -> &dyn SessionRepository {
        &self.sessions
    }

    fn ip_policies(&self) -> &dyn IpPolicyRepository {
        &self.ip_policies
    }

    fn audit_logs(&self) -> &dyn AuditLogRepository {
        &self.audit_logs
    }
}
