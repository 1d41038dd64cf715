//! Token signing and password hashing

pub mod jwt;
pub mod password;

pub use jwt::{create_token, token_fingerprint, verify_token, JwtConfig, TokenClaims};
pub use password::{hash_password, hash_password_blocking, verify_password, verify_password_blocking};
