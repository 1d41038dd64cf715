//! Authorization guard for admin-only operations

use std::sync::Arc;

use tracing::warn;

use crate::domain::{RepositoryProvider, User};
use crate::shared::{DomainError, DomainResult};

#[derive(Clone)]
pub struct AuthorizationGuard {
    repos: Arc<dyn RepositoryProvider>,
}

impl AuthorizationGuard {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// The role is read from the credential store on every call, never from
    /// token claims. Missing accounts and lookup failures deny.
    pub async fn require_admin(&self, username: &str) -> DomainResult<User> {
        match self.repos.users().find_by_username(username).await {
            Ok(Some(user)) if user.is_admin() => Ok(user),
            Ok(_) => Err(DomainError::Forbidden("Admin privileges required".into())),
            Err(e) => {
                warn!(username = %username, error = %e, "Role lookup failed; denying");
                Err(e)
            }
        }
    }
}
