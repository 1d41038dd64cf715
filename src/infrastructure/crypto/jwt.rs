//! JWT Token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: i64, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
            issuer: issuer.into(),
        }
    }
}

/// JWT TokenClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Username
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Token id; keeps two tokens minted in the same second distinct
    pub jti: String,
}

impl TokenClaims {
    /// Create new TokenClaims for a user
    pub fn new(username: &str, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            sub: username.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Create a signed token for a user
pub fn create_token(username: &str, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(username, config);
    encode_claims(&claims, config)
}

pub(crate) fn encode_claims(
    claims: &TokenClaims,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, issuer and expiry, then decode the claims.
///
/// Does not consult the revocation ledger.
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// Short stable identifier for a token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret-0123456789", 24, "nts-test")
    }

    #[test]
    fn issued_token_verifies() {
        let cfg = config();
        let token = create_token("alice", &cfg).unwrap();
        let claims = verify_token(&token, &cfg).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn same_second_tokens_are_distinct() {
        let cfg = config();
        let a = create_token("alice", &cfg).unwrap();
        let b = create_token("alice", &cfg).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = config();
        let mut claims = TokenClaims::new("alice", &cfg);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 5;
        let token = encode_claims(&claims, &cfg).unwrap();
        assert!(verify_token(&token, &cfg).is_err());
    }

    #[test]
    fn wrong_secret_and_tampering_are_rejected() {
        let cfg = config();
        let token = create_token("alice", &cfg).unwrap();

        let other = JwtConfig::new("another-secret-0123456789", 24, "nts-test");
        assert!(verify_token(&token, &other).is_err());

        // alice's signature over mallory's claims
        let forged_claims = create_token("mallory", &cfg).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_claims.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert!(verify_token(&tampered, &cfg).is_err());

        assert!(verify_token("not-a-token", &cfg).is_err());
        assert!(verify_token("", &cfg).is_err());
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let cfg = config();
        let foreign = JwtConfig::new(cfg.secret.clone(), 24, "someone-else");
        let token = create_token("alice", &foreign).unwrap();
        assert!(verify_token(&token, &cfg).is_err());
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let fp = token_fingerprint("abc");
        assert_eq!(fp.len(), 12);
        assert_eq!(fp, token_fingerprint("abc"));
        assert_ne!(fp, token_fingerprint("abd"));
    }
}
