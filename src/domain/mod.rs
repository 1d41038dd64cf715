//! Domain layer: entities, value types and repository interfaces.

pub mod audit;
pub mod ip_policy;
pub mod repositories;
pub mod revocation;
pub mod session;
pub mod user;

pub use audit::{AuditLogRepository, LogLevel, NewLogEntry, SystemLogEntry};
pub use ip_policy::{
    canonical_ip, AccessDecision, AllowedIp, BlockedIp, IpPolicyRepository, NewAllowedIp,
    NewBlockedIp,
};
pub use repositories::RepositoryProvider;
pub use revocation::{RevocationRepository, RevokedToken};
pub use session::{
    ActiveSessionView, DeactivateCriteria, GeoLocation, NewSession, Session, SessionRepository,
};
pub use user::{CreateUserDto, GetUserDto, User, UserRepository, UserRole, UserSortField, UserTag};

pub use crate::shared::{DomainError, DomainResult};
