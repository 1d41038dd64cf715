use async_trait::async_trait;

use super::{AllowedIp, BlockedIp, NewAllowedIp, NewBlockedIp};
use crate::shared::DomainResult;

#[async_trait]
pub trait IpPolicyRepository: Send + Sync {
    async fn is_blocked(&self, ip: &str) -> DomainResult<bool>;
    async fn is_allowed(&self, ip: &str) -> DomainResult<bool>;
    /// Number of active allow-list entries
    async fn count_allowed(&self) -> DomainResult<u64>;
    async fn count_blocked(&self) -> DomainResult<u64>;

    async fn list_allowed(&self) -> DomainResult<Vec<AllowedIp>>;
    async fn add_allowed(&self, entry: NewAllowedIp) -> DomainResult<AllowedIp>;
    /// Returns false when no row has this id.
    async fn remove_allowed(&self, id: i32) -> DomainResult<bool>;

    async fn list_blocked(&self) -> DomainResult<Vec<BlockedIp>>;
    async fn add_blocked(&self, entry: NewBlockedIp) -> DomainResult<BlockedIp>;
    async fn find_blocked(&self, id: i32) -> DomainResult<Option<BlockedIp>>;
    async fn remove_blocked(&self, id: i32) -> DomainResult<bool>;
}
