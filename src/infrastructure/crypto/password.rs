//! Password hashing utilities
//!
//! bcrypt is CPU bound; the async variants run it on the blocking pool.

use bcrypt::{hash, verify};

use crate::shared::{DomainError, DomainResult};

pub const HASH_COST: u32 = 10;

/// Hash a password using bcrypt
pub fn hash_password_blocking(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, HASH_COST)
}

/// Verify a password against a hash
pub fn verify_password_blocking(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

pub async fn hash_password(password: &str) -> DomainResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password_blocking(&password))
        .await
        .map_err(|e| DomainError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| DomainError::Internal(format!("failed to hash password: {}", e)))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> DomainResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let result = tokio::task::spawn_blocking(move || verify_password_blocking(&password, &hash))
        .await
        .map_err(|e| DomainError::Internal(format!("hashing task failed: {}", e)))?;
    Ok(result.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("secret1").await.unwrap();
        assert_ne!(hashed, "secret1");
        assert!(verify_password("secret1", &hashed).await.unwrap());
        assert!(!verify_password("secret2", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("secret1", "not-a-bcrypt-hash").await.unwrap());
    }
}
