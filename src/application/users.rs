//! User administration
//!
//! The bootstrap account is identified by its `is_bootstrap` marker and can
//! never be deleted, retagged, demoted or force-logged-out.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::domain::{
    CreateUserDto, DeactivateCriteria, DomainError, DomainResult, GetUserDto, RepositoryProvider,
    User, UserRole, UserTag,
};
use crate::infrastructure::crypto::password::hash_password;
use crate::shared::PaginatedResult;

use super::audit::AuditTrail;
use super::session_registry::SessionRegistry;

#[derive(Debug, Clone)]
pub struct NewUserRequest {
    pub username: String,
    pub password: String,
    pub tag: UserTag,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    UpdateTag(Option<UserTag>),
}

#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    pub processed: usize,
    pub failed: Vec<String>,
}

#[derive(Clone)]
pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
    registry: SessionRegistry,
    audit: AuditTrail,
    bootstrap_username: String,
}

impl UserService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        registry: SessionRegistry,
        audit: AuditTrail,
        bootstrap_username: impl Into<String>,
    ) -> Self {
        Self {
            repos,
            registry,
            audit,
            bootstrap_username: bootstrap_username.into(),
        }
    }

    /// Load a mutable target: absent is 404, bootstrap is 403.
    async fn mutable_target(&self, username: &str, forbidden: &str) -> DomainResult<User> {
        let user = self
            .repos
            .users()
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "username", username))?;
        if user.is_bootstrap {
            return Err(DomainError::Forbidden(forbidden.to_string()));
        }
        Ok(user)
    }

    pub async fn create(&self, req: NewUserRequest, actor: &str) -> DomainResult<User> {
        if req.username.eq_ignore_ascii_case(&self.bootstrap_username) {
            return Err(DomainError::Forbidden("Cannot create admin user".into()));
        }

        let password_hash = hash_password(&req.password).await?;
        let user = self
            .repos
            .users()
            .create(CreateUserDto {
                username: req.username,
                password_hash,
                role: UserRole::from_admin_flag(req.is_admin),
                tag: Some(req.tag),
                is_bootstrap: false,
            })
            .await
            .map_err(|e| match e {
                DomainError::Conflict(_) => DomainError::Conflict("User already exists".into()),
                other => other,
            })?;

        info!(username = %user.username, role = %user.role, actor = %actor, "User created");
        self.audit
            .info(
                format!("User {} created by {} (role {})", user.username, actor, user.role),
                Some(actor),
                None,
            )
            .await;
        Ok(user)
    }

    pub async fn list(&self, query: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        self.repos.users().list(query).await
    }

    /// Delete a user after revoking and deactivating their live sessions.
    pub async fn delete(&self, username: &str, actor: &str) -> DomainResult<()> {
        self.mutable_target(username, "Cannot delete Admin user").await?;

        self.registry
            .deactivate(&DeactivateCriteria::User(username.to_string()))
            .await?;
        if !self.repos.users().delete(username).await? {
            return Err(DomainError::not_found("User", "username", username));
        }

        info!(username = %username, actor = %actor, "User deleted");
        self.audit
            .info(format!("User {} deleted by {}", username, actor), Some(actor), None)
            .await;
        Ok(())
    }

    pub async fn set_tag(&self, username: &str, tag: Option<UserTag>, actor: &str) -> DomainResult<()> {
        self.mutable_target(username, "Cannot modify Admin user tag").await?;
        if !self.repos.users().set_tag(username, tag).await? {
            return Err(DomainError::not_found("User", "username", username));
        }
        self.audit
            .info(
                format!(
                    "Tag of {} set to {} by {}",
                    username,
                    tag.map(|t| t.as_str()).unwrap_or("none"),
                    actor
                ),
                Some(actor),
                None,
            )
            .await;
        Ok(())
    }

    pub async fn set_admin(&self, username: &str, is_admin: bool, actor: &str) -> DomainResult<()> {
        self.mutable_target(username, "Cannot change Admin user role").await?;
        let role = UserRole::from_admin_flag(is_admin);
        if !self.repos.users().set_role(username, role).await? {
            return Err(DomainError::not_found("User", "username", username));
        }
        info!(username = %username, role = %role, actor = %actor, "User role changed");
        self.audit
            .info(
                format!("Role of {} set to {} by {}", username, role, actor),
                Some(actor),
                None,
            )
            .await;
        Ok(())
    }

    /// Apply `action` to each user. Rejected as a whole if the list names
    /// the bootstrap account; otherwise per-user failures are collected.
    pub async fn bulk(
        &self,
        action: BulkAction,
        usernames: &[String],
        actor: &str,
    ) -> DomainResult<BulkOutcome> {
        for username in usernames {
            let is_bootstrap = username.eq_ignore_ascii_case(&self.bootstrap_username)
                || self
                    .repos
                    .users()
                    .find_by_username(username)
                    .await?
                    .is_some_and(|u| u.is_bootstrap);
            if is_bootstrap {
                return Err(DomainError::Forbidden(
                    "Bulk operations cannot include the Admin user".into(),
                ));
            }
        }

        let mut outcome = BulkOutcome::default();
        for username in usernames {
            let result = match &action {
                BulkAction::Delete => self.delete(username, actor).await,
                BulkAction::UpdateTag(tag) => self.set_tag(username, *tag, actor).await,
            };
            match result {
                Ok(()) => outcome.processed += 1,
                Err(e) if e.is_storage() => return Err(e),
                Err(e) => {
                    warn!(username = %username, error = %e, "Bulk user operation skipped");
                    outcome.failed.push(username.clone());
                }
            }
        }
        Ok(outcome)
    }

    /// Make sure exactly one account carries the bootstrap marker.
    ///
    /// An existing bootstrap account is kept as is (its password is not
    /// reset). Otherwise the configured account is promoted, or created.
    pub async fn ensure_bootstrap(&self, admin: &AdminConfig, production: bool) -> DomainResult<User> {
        let users = self.repos.users();

        if let Some(existing) = users.find_bootstrap().await? {
            users.mark_bootstrap(&existing.username).await?;
            return users
                .find_by_username(&existing.username)
                .await?
                .ok_or_else(|| DomainError::Internal("bootstrap account vanished".into()));
        }

        let user = match users.find_by_username(&admin.username).await? {
            Some(user) => {
                users.mark_bootstrap(&user.username).await?;
                users
                    .find_by_username(&user.username)
                    .await?
                    .ok_or_else(|| DomainError::Internal("bootstrap account vanished".into()))?
            }
            None => {
                let password_hash = hash_password(&admin.password).await?;
                let user = users
                    .create(CreateUserDto {
                        username: admin.username.clone(),
                        password_hash,
                        role: UserRole::Admin,
                        tag: None,
                        is_bootstrap: true,
                    })
                    .await?;
                info!(username = %user.username, "Bootstrap admin account created");
                user
            }
        };

        if production && admin.uses_default_password() {
            warn!(
                username = %user.username,
                "Bootstrap admin uses the default password; change it before exposing the service"
            );
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{client, services_with_user};

    #[tokio::test]
    async fn bootstrap_account_is_immune() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;

        let err = svc.users.delete("Admin", "Admin").await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = svc.users.set_admin("Admin", false, "Admin").await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = svc.users.set_tag("Admin", Some(UserTag::RZ), "Admin").await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = svc
            .users
            .bulk(BulkAction::Delete, &["alice".into(), "Admin".into()], "Admin")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let admin = svc.repos.users().find_by_username("Admin").await.unwrap().unwrap();
        assert!(admin.is_admin());
        assert!(svc.repos.users().find_by_username("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bootstrap_name_cannot_be_recreated() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let err = svc
            .users
            .create(
                NewUserRequest {
                    username: "admin".into(),
                    password: "secret1".into(),
                    tag: UserTag::RZ,
                    is_admin: false,
                },
                "Admin",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn ensure_bootstrap_is_repeatable() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let again = svc
            .users
            .ensure_bootstrap(&AdminConfig::default(), false)
            .await
            .unwrap();
        assert_eq!(again.username, "Admin");
        assert!(again.is_bootstrap);
        let page = svc.users.list(GetUserDto::default()).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn deleting_a_user_revokes_their_sessions() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let login = svc.lifecycle.login("alice", "secret1", &client()).await.unwrap();

        svc.users.delete("alice", "Admin").await.unwrap();
        assert!(svc.ledger.is_revoked(&login.token).await.unwrap());
        let err = svc.users.delete("alice", "Admin").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn bulk_collects_missing_users() {
        let (svc, _db) = services_with_user("alice", "secret1", false).await;
        let outcome = svc
            .users
            .bulk(
                BulkAction::UpdateTag(Some(UserTag::KR)),
                &["alice".into(), "ghost".into()],
                "Admin",
            )
            .await
            .unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.failed, vec!["ghost".to_string()]);
        let alice = svc.repos.users().find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.tag, Some(UserTag::KR));
    }
}
