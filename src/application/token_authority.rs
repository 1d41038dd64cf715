//! Token authority: issues and verifies signed access tokens.

use tracing::debug;

use crate::infrastructure::crypto::jwt::{create_token, token_fingerprint, verify_token, JwtConfig, TokenClaims};
use crate::shared::{DomainError, DomainResult};

#[derive(Clone, Debug)]
pub struct TokenAuthority {
    config: JwtConfig,
}

impl TokenAuthority {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Sign a token for an already verified credential.
    pub fn issue(&self, username: &str) -> DomainResult<String> {
        create_token(username, &self.config)
            .map_err(|e| DomainError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Signature, issuer and expiry only. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        match verify_token(token, &self.config) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!(token_id = %token_fingerprint(token), error = %e, "Token rejected");
                None
            }
        }
    }

    /// Lifetime of newly issued tokens, in seconds
    pub fn expires_in(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_and_are_unique() {
        let authority = TokenAuthority::new(JwtConfig::new("authority-secret-0123456789", 24, "nts-test"));
        let first = authority.issue("alice").unwrap();
        let second = authority.issue("alice").unwrap();
        assert_ne!(first, second);

        let claims = authority.verify(&first).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(authority.expires_in(), 24 * 3600);
    }

    #[test]
    fn foreign_or_garbage_tokens_fail_closed() {
        let authority = TokenAuthority::new(JwtConfig::new("authority-secret-0123456789", 24, "nts-test"));
        let other = TokenAuthority::new(JwtConfig::new("another-secret-0123456789", 24, "nts-test"));

        assert!(authority.verify(&other.issue("alice").unwrap()).is_none());
        assert!(authority.verify("not.a.token").is_none());
        assert!(authority.verify("").is_none());
    }
}
