use async_trait::async_trait;

use super::{CreateUserDto, GetUserDto, User, UserRole, UserTag};
use crate::shared::{DomainResult, PaginatedResult};

/// Credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, dto: CreateUserDto) -> DomainResult<User>;

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn find_bootstrap(&self) -> DomainResult<Option<User>>;
    async fn list(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>>;

    /// Returns false when no such user exists.
    async fn set_tag(&self, username: &str, tag: Option<UserTag>) -> DomainResult<bool>;
    async fn set_role(&self, username: &str, role: UserRole) -> DomainResult<bool>;
    /// Flag `username` as the bootstrap account (forcing the admin role)
    /// and clear the flag on every other row.
    async fn mark_bootstrap(&self, username: &str) -> DomainResult<()>;

    async fn delete(&self, username: &str) -> DomainResult<bool>;
}
