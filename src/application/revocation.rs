//! Revocation ledger

use std::sync::Arc;

use tracing::debug;

use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::token_fingerprint;
use crate::shared::DomainResult;

#[derive(Clone)]
pub struct RevocationLedger {
    repos: Arc<dyn RepositoryProvider>,
}

impl RevocationLedger {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Idempotent: revoking a dead token again succeeds.
    pub async fn revoke(&self, token: &str) -> DomainResult<()> {
        let added = self.repos.revocations().insert(token).await?;
        debug!(token_id = %token_fingerprint(token), added, "Token revoked");
        Ok(())
    }

    pub async fn revoke_all(&self, tokens: &[String]) -> DomainResult<()> {
        for token in tokens {
            self.revoke(token).await?;
        }
        Ok(())
    }

    /// Storage errors propagate; callers gating access must treat them as a denial.
    pub async fn is_revoked(&self, token: &str) -> DomainResult<bool> {
        self.repos.revocations().contains(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::{test_database, SeaOrmRepositoryProvider};

    #[tokio::test]
    async fn revoked_tokens_stay_revoked() {
        let ledger = RevocationLedger::new(Arc::new(SeaOrmRepositoryProvider::new(test_database().await)));

        ledger.revoke("a").await.unwrap();
        ledger.revoke("a").await.unwrap();
        ledger.revoke_all(&["a".to_string(), "b".to_string()]).await.unwrap();

        assert!(ledger.is_revoked("a").await.unwrap());
        assert!(ledger.is_revoked("b").await.unwrap());
        assert!(!ledger.is_revoked("c").await.unwrap());
    }
}
