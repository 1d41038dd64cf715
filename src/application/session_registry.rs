//! Session registry
//!
//! Tracks one row per issued token. Deactivation is a single conditional
//! update followed by revoking every inactive session's token, so a
//! torn-down session cannot be replayed once the call returns.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    ActiveSessionView, DeactivateCriteria, GeoLocation, NewSession, RepositoryProvider, Session,
};
use crate::infrastructure::crypto::jwt::token_fingerprint;
use crate::shared::DomainResult;

use super::revocation::RevocationLedger;

#[derive(Clone)]
pub struct SessionRegistry {
    repos: Arc<dyn RepositoryProvider>,
    ledger: RevocationLedger,
}

impl SessionRegistry {
    pub fn new(repos: Arc<dyn RepositoryProvider>, ledger: RevocationLedger) -> Self {
        Self { repos, ledger }
    }

    pub async fn register(
        &self,
        username: &str,
        token: &str,
        ip: &str,
        user_agent: &str,
        geo: GeoLocation,
    ) -> DomainResult<Session> {
        let session = self
            .repos
            .sessions()
            .insert(NewSession {
                username: username.to_string(),
                token: token.to_string(),
                ip_address: ip.to_string(),
                user_agent: user_agent.to_string(),
                geo,
            })
            .await?;
        debug!(username = %username, token_id = %token_fingerprint(token), "Session registered");
        Ok(session)
    }

    /// Advance `last_activity`; no-op for unknown or inactive tokens.
    pub async fn touch(&self, token: &str) -> DomainResult<bool> {
        let changed = self.repos.sessions().touch(token, Utc::now()).await?;
        Ok(changed > 0)
    }

    /// Deactivate every live session matching `criteria`, then revoke the
    /// tokens of all inactive sessions still missing from the ledger. A run
    /// interrupted between the two steps is completed by the next call.
    /// Returns the number of rows deactivated.
    pub async fn deactivate(&self, criteria: &DeactivateCriteria) -> DomainResult<u64> {
        let sessions = self.repos.sessions();
        let affected = sessions.deactivate(criteria).await?;

        let pending = sessions.unrevoked_inactive_tokens().await?;
        self.ledger.revoke_all(&pending).await?;

        if affected > 0 {
            metrics::counter!("sessions_deactivated_total", "reason" => criteria.reason())
                .increment(affected);
            info!(reason = criteria.reason(), count = affected, "Sessions deactivated");
        }
        if !pending.is_empty() {
            debug!(count = pending.len(), "Tokens of deactivated sessions revoked");
        }
        Ok(affected)
    }

    /// Latest live session per user
    pub async fn list_active(&self) -> DomainResult<Vec<ActiveSessionView>> {
        self.repos.sessions().latest_active_per_user().await
    }

    pub async fn find(&self, token: &str) -> DomainResult<Option<Session>> {
        self.repos.sessions().find_by_token(token).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::sea_query::Expr;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    use super::*;
    use crate::application::testing::{client, services_with_user};
    use crate::infrastructure::database::entities::active_session;

    #[tokio::test]
    async fn stale_sweep_leaves_a_freshly_touched_session_alone() {
        let (svc, db) = services_with_user("alice", "secret1", false).await;
        let login = svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();
        active_session::Entity::update_many()
            .col_expr(active_session::Column::LastActivity, Expr::value(Utc::now() - Duration::hours(25)))
            .filter(active_session::Column::Token.eq(login.token.as_str()))
            .exec(&db)
            .await
            .unwrap();

        let cutoff = Utc::now() - Duration::hours(24);
        assert!(svc.registry.touch(&login.token).await.unwrap());

        let swept = svc
            .registry
            .deactivate(&DeactivateCriteria::StaleBefore(cutoff))
            .await
            .unwrap();
        assert_eq!(swept, 0);
        assert!(svc.registry.find(&login.token).await.unwrap().unwrap().is_active);
        assert!(!svc.ledger.is_revoked(&login.token).await.unwrap());
    }

    #[tokio::test]
    async fn deactivation_finishes_an_interrupted_revocation() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let a = svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();
        let b = svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();

        // Session flipped without its token reaching the ledger
        svc.repos
            .sessions()
            .deactivate(&DeactivateCriteria::Token(a.token.clone()))
            .await
            .unwrap();
        assert!(!svc.ledger.is_revoked(&a.token).await.unwrap());

        let closed = svc
            .registry
            .deactivate(&DeactivateCriteria::Token(b.token.clone()))
            .await
            .unwrap();
        assert_eq!(closed, 1);
        assert!(svc.ledger.is_revoked(&a.token).await.unwrap());
        assert!(svc.ledger.is_revoked(&b.token).await.unwrap());

        // Nothing left to close, still idempotent
        assert_eq!(
            svc.registry
                .deactivate(&DeactivateCriteria::User("alice".into()))
                .await
                .unwrap(),
            0
        );
    }
}
