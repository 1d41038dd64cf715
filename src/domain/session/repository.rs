use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ActiveSessionView, DeactivateCriteria, NewSession, Session};
use crate::shared::DomainResult;

/// Session registry storage.
///
/// Every mutation is a single conditional UPDATE so concurrent touches and
/// logouts on the same token never lose each other's writes.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: NewSession) -> DomainResult<Session>;

    /// `SET last_activity = at WHERE token = ? AND is_active AND last_activity < at`.
    /// Returns the number of rows changed (0 or 1).
    async fn touch(&self, token: &str, at: DateTime<Utc>) -> DomainResult<u64>;

    /// `SET is_active = false WHERE is_active AND <criteria>`, evaluated in
    /// one statement so a concurrent touch is never overridden by a stale read.
    async fn deactivate(&self, criteria: &DeactivateCriteria) -> DomainResult<u64>;

    /// Tokens of inactive sessions that are missing from the revocation ledger.
    async fn unrevoked_inactive_tokens(&self) -> DomainResult<Vec<String>>;

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Session>>;

    /// All live sessions
    async fn list_active(&self) -> DomainResult<Vec<Session>>;

    /// One row per username with a live session: the most recently active one.
    /// Sessions whose user no longer exists are omitted.
    async fn latest_active_per_user(&self) -> DomainResult<Vec<ActiveSessionView>>;
}
