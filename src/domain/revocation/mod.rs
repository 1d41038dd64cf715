//! Revoked token ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::DomainResult;

#[derive(Debug, Clone)]
pub struct RevokedToken {
    pub token: String,
    pub revoked_at: DateTime<Utc>,
}

/// Append-only set of dead tokens. Entries are never removed.
#[async_trait]
pub trait RevocationRepository: Send + Sync {
    /// Insert-or-ignore. Returns true when the token was newly added.
    async fn insert(&self, token: &str) -> DomainResult<bool>;
    async fn contains(&self, token: &str) -> DomainResult<bool>;
    async fn find(&self, token: &str) -> DomainResult<Option<RevokedToken>>;
}
