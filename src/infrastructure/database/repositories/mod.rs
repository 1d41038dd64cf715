//! SeaORM repository implementations

pub mod audit_log_repository;
pub mod ip_policy_repository;
pub mod repository_provider;
pub mod revocation_repository;
pub mod session_repository;
pub mod user_repository;

pub use audit_log_repository::SeaOrmAuditLogRepository;
pub use ip_policy_repository::SeaOrmIpPolicyRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use revocation_repository::SeaOrmRevocationRepository;
pub use session_repository::SeaOrmSessionRepository;
pub use user_repository::SeaOrmUserRepository;
