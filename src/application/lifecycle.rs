//! Session lifecycle controller
//!
//! Per token: `ISSUED -> ACTIVE -> (REVOKED | EXPIRED)`. Revocation happens
//! through logout, forced logout, mass logout and the staleness sweep.
//! Expiry is only observed when a token is verified.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::domain::{DeactivateCriteria, GeoLocation, RepositoryProvider, User};
use crate::infrastructure::crypto::jwt::{token_fingerprint, TokenClaims};
use crate::infrastructure::crypto::password::verify_password;
use crate::infrastructure::geo::GeoLocator;
use crate::shared::{DomainError, DomainResult};

use super::audit::AuditTrail;
use super::context::ClientContext;
use super::revocation::RevocationLedger;
use super::session_registry::SessionRegistry;
use super::token_authority::TokenAuthority;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
    pub geo: GeoLocation,
}

/// Result of inspecting a presented token
#[derive(Debug, Clone)]
pub enum TokenStatus {
    Valid(TokenClaims),
    Revoked,
    Invalid,
}

#[derive(Clone)]
pub struct SessionLifecycle {
    repos: Arc<dyn RepositoryProvider>,
    tokens: TokenAuthority,
    ledger: RevocationLedger,
    registry: SessionRegistry,
    geo: Arc<dyn GeoLocator>,
    audit: AuditTrail,
    stale_after: Duration,
}

impl SessionLifecycle {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        tokens: TokenAuthority,
        ledger: RevocationLedger,
        registry: SessionRegistry,
        geo: Arc<dyn GeoLocator>,
        audit: AuditTrail,
        stale_after: Duration,
    ) -> Self {
        Self {
            repos,
            tokens,
            ledger,
            registry,
            geo,
            audit,
            stale_after,
        }
    }

    /// Verify credentials, issue a token and register its session.
    /// Concurrent logins of one user each get their own token and session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client: &ClientContext,
    ) -> DomainResult<LoginOutcome> {
        let user = self.repos.users().find_by_username(username).await?;
        let verified = match &user {
            Some(user) => verify_password(password, &user.password_hash).await?,
            None => false,
        };
        let Some(user) = user.filter(|_| verified) else {
            metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
            warn!(username = %username, ip = %client.ip, "Failed login attempt");
            self.audit
                .warn(
                    format!("Failed login attempt for {}", username),
                    Some(username),
                    Some(&client.ip),
                )
                .await;
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.into()));
        };

        let token = self.tokens.issue(&user.username)?;

        let geo = match &client.geo {
            Some(geo) if geo.is_known() => geo.clone(),
            _ => self.geo.locate(&client.ip).await,
        };

        self.registry
            .register(&user.username, &token, &client.ip, &client.user_agent, geo.clone())
            .await?;

        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        info!(
            username = %user.username,
            ip = %client.ip,
            token_id = %token_fingerprint(&token),
            location = %geo.label(),
            "User logged in"
        );
        self.audit
            .info(
                format!(
                    "User {} logged in from {} ({}, {})",
                    user.username, client.ip, geo.city, geo.country
                ),
                Some(&user.username),
                Some(&client.ip),
            )
            .await;

        Ok(LoginOutcome {
            token,
            expires_in: self.tokens.expires_in(),
            user,
            geo,
        })
    }

    /// Revoke a token and deactivate its session. Idempotent, and accepts
    /// tokens that no longer verify.
    pub async fn logout(&self, token: &str, client: &ClientContext) -> DomainResult<()> {
        self.ledger.revoke(token).await?;
        self.registry
            .deactivate(&DeactivateCriteria::Token(token.to_string()))
            .await?;

        let username = self.tokens.verify(token).map(|c| c.username);
        info!(
            username = username.as_deref().unwrap_or("-"),
            token_id = %token_fingerprint(token),
            "Token revoked on logout"
        );
        self.audit
            .info(
                format!("User {} logged out", username.as_deref().unwrap_or("unknown")),
                username.as_deref(),
                Some(&client.ip),
            )
            .await;
        Ok(())
    }

    /// Close every live session of `username`. The bootstrap account is
    /// never a valid target.
    pub async fn logout_user(&self, username: &str, actor: &str) -> DomainResult<u64> {
        if let Some(user) = self.repos.users().find_by_username(username).await? {
            if user.is_bootstrap {
                return Err(DomainError::Forbidden(
                    "Cannot force logout of the Admin user".into(),
                ));
            }
        }

        let closed = self
            .registry
            .deactivate(&DeactivateCriteria::User(username.to_string()))
            .await?;

        if closed > 0 {
            self.audit
                .warn(
                    format!("Admin {} forced logout of {} ({} sessions)", actor, username, closed),
                    Some(actor),
                    None,
                )
                .await;
        }
        Ok(closed)
    }

    /// Close every live session except those of the bootstrap account.
    pub async fn logout_all(&self, actor: &str) -> DomainResult<u64> {
        let closed = self
            .registry
            .deactivate(&DeactivateCriteria::AllExceptBootstrap)
            .await?;
        self.audit
            .warn(
                format!("Admin {} logged out all users ({} sessions)", actor, closed),
                Some(actor),
                None,
            )
            .await;
        Ok(closed)
    }

    /// Deactivate and revoke sessions idle longer than the staleness window.
    pub async fn sweep_stale(&self) -> DomainResult<u64> {
        let cutoff = Utc::now() - self.stale_after;
        let cleaned = self
            .registry
            .deactivate(&DeactivateCriteria::StaleBefore(cutoff))
            .await?;
        if cleaned > 0 {
            info!(count = cleaned, "Stale sessions swept");
            self.audit
                .info(format!("Cleaned up {} stale sessions", cleaned), None, None)
                .await;
        }
        Ok(cleaned)
    }

    /// Signature and expiry first, then the revocation ledger.
    /// A ledger failure is returned as-is so the caller denies.
    pub async fn authenticate(&self, token: &str) -> DomainResult<TokenClaims> {
        let claims = self
            .tokens
            .verify(token)
            .ok_or_else(|| DomainError::Forbidden("Invalid or expired token".into()))?;
        if self.ledger.is_revoked(token).await? {
            return Err(DomainError::Forbidden("Token revoked".into()));
        }
        Ok(claims)
    }

    /// Non-failing inspection used by the public verify endpoint.
    /// The ledger is consulted first so a revoked token reports as such
    /// even after it has expired.
    pub async fn inspect(&self, token: &str) -> DomainResult<TokenStatus> {
        if self.ledger.is_revoked(token).await? {
            return Ok(TokenStatus::Revoked);
        }
        Ok(match self.tokens.verify(token) {
            Some(claims) => TokenStatus::Valid(claims),
            None => TokenStatus::Invalid,
        })
    }

    /// Record activity for an authenticated request. Failures are only logged.
    pub async fn record_activity(&self, token: &str) {
        if let Err(e) = self.registry.touch(token).await {
            warn!(token_id = %token_fingerprint(token), error = %e, "Failed to update session activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use sea_orm::sea_query::Expr;

    use super::*;
    use crate::application::testing::{client, services_with_user};
    use crate::infrastructure::database::entities::active_session;

    #[tokio::test]
    async fn login_registers_a_session() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let outcome = svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();

        let session = svc.registry.find(&outcome.token).await.unwrap().unwrap();
        assert!(session.is_active);
        assert_eq!(session.username, "alice");
        assert_eq!(session.ip_address, "127.0.0.1");
        assert_eq!(outcome.expires_in, 24 * 3600);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthenticated() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let wrong = svc.lifecycle.login("alice", "nope!", &client()).await;
        assert!(matches!(wrong, Err(DomainError::Unauthenticated(_))));
        let missing = svc.lifecycle.login("nobody", "secret1", &client()).await;
        assert!(matches!(missing, Err(DomainError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn concurrent_logins_are_independent() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let ctx = client();
        let (a, b) = tokio::join!(
            svc.lifecycle.login("alice", "secret1", &ctx),
            svc.lifecycle.login("alice", "secret1", &ctx)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.token, b.token);

        svc.lifecycle.logout(&a.token, &ctx).await.unwrap();
        assert!(svc.lifecycle.authenticate(&b.token).await.is_ok());
    }

    #[tokio::test]
    async fn revocation_is_permanent() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let ctx = client();
        let login = svc.lifecycle.login("alice", "secret1", &ctx).await.unwrap();
        assert!(svc.lifecycle.authenticate(&login.token).await.is_ok());

        svc.ledger.revoke(&login.token).await.unwrap();
        for _ in 0..3 {
            assert!(matches!(
                svc.lifecycle.authenticate(&login.token).await,
                Err(DomainError::Forbidden(_))
            ));
            assert!(matches!(
                svc.lifecycle.inspect(&login.token).await.unwrap(),
                TokenStatus::Revoked
            ));
        }
        svc.ledger.revoke(&login.token).await.unwrap();
    }

    #[tokio::test]
    async fn ledger_failure_fails_closed() {
        use sea_orm::ConnectionTrait;

        let (svc, db) = services_with_user("alice", "secret1", false).await;
        let login = svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();
        db.execute_unprepared("DROP TABLE revoked_tokens").await.unwrap();

        assert!(matches!(
            svc.lifecycle.authenticate(&login.token).await,
            Err(DomainError::Storage(_))
        ));
        assert!(matches!(
            svc.lifecycle.inspect(&login.token).await,
            Err(DomainError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn logout_twice_is_idempotent() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let ctx = client();
        let login = svc.lifecycle.login("alice", "secret1", &ctx).await.unwrap();

        svc.lifecycle.logout(&login.token, &ctx).await.unwrap();
        svc.lifecycle.logout(&login.token, &ctx).await.unwrap();

        let session = svc.registry.find(&login.token).await.unwrap().unwrap();
        assert!(!session.is_active);
        assert!(!svc.registry.touch(&login.token).await.unwrap());
    }

    #[tokio::test]
    async fn bootstrap_cannot_be_force_logged_out() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let ctx = client();
        let admin = svc.lifecycle.login("Admin", "Admin", &ctx).await.unwrap();
        let alice = svc.lifecycle.login("alice", "secret1", &ctx).await.unwrap();

        let err = svc.lifecycle.logout_user("Admin", "Admin").await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        assert_eq!(svc.lifecycle.logout_all("Admin").await.unwrap(), 1);
        assert!(svc.lifecycle.authenticate(&admin.token).await.is_ok());
        assert!(svc.lifecycle.authenticate(&alice.token).await.is_err());
    }

    #[tokio::test]
    async fn forced_logout_revokes_every_session() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let ctx = client();
        let a = svc.lifecycle.login("alice", "secret1", &ctx).await.unwrap();
        let b = svc.lifecycle.login("alice", "secret1", &ctx).await.unwrap();

        assert_eq!(svc.lifecycle.logout_user("alice", "Admin").await.unwrap(), 2);
        assert_eq!(svc.lifecycle.logout_user("alice", "Admin").await.unwrap(), 0);
        assert!(svc.ledger.is_revoked(&a.token).await.unwrap());
        assert!(svc.ledger.is_revoked(&b.token).await.unwrap());
    }

    #[tokio::test]
    async fn sweep_only_touches_stale_sessions() {
        let (svc, db) = services_with_user("alice", "secret1", false).await;
        let ctx = client();
        let login = svc.lifecycle.login("alice", "secret1", &ctx).await.unwrap();

        assert_eq!(svc.lifecycle.sweep_stale().await.unwrap(), 0);

        active_session::Entity::update_many()
            .col_expr(
                active_session::Column::LastActivity,
                Expr::value(Utc::now() - Duration::hours(25)),
            )
            .filter(active_session::Column::Token.eq(login.token.as_str()))
            .exec(&db)
            .await
            .unwrap();

        assert_eq!(svc.lifecycle.sweep_stale().await.unwrap(), 1);
        assert!(matches!(
            svc.lifecycle.inspect(&login.token).await.unwrap(),
            TokenStatus::Revoked
        ));
    }

    #[tokio::test]
    async fn activity_never_regresses() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let login = svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();

        let mut last = svc.registry.find(&login.token).await.unwrap().unwrap().last_activity;
        for _ in 0..5 {
            svc.lifecycle.record_activity(&login.token).await;
            let now = svc.registry.find(&login.token).await.unwrap().unwrap();
            assert!(now.last_activity >= last);
            assert!(now.last_activity >= now.login_time);
            last = now.last_activity;
        }
    }
}
