use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Usernames are 3-20 characters of `[A-Za-z0-9_]`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_charset");
        err.message = Some("Username may only contain letters, digits and underscores".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3-20 characters"),
        custom(function = "validate_username")
    )]
    #[schema(example = "Admin")]
    pub username: String,
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: LoginUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginUser {
    pub username: String,
    pub is_admin: bool,
    pub tag: Option<String>,
    pub location: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub token: Option<String>,
}

impl TokenRequest {
    /// The token, if present and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenStatusResponse {
    pub valid: bool,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        let ok = LoginRequest {
            username: "alice_01".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());

        let long = "a".repeat(21);
        for bad in ["al", "alice-smith", long.as_str(), "bob smith"] {
            let req = LoginRequest {
                username: bad.to_string(),
                password: "secret".into(),
            };
            assert!(req.validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let req = LoginRequest {
            username: "alice".into(),
            password: "1234".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let req: TokenRequest = serde_json::from_str(r#"{"token":"  "}"#).unwrap();
        assert_eq!(req.token(), None);
        let req: TokenRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.token(), None);
    }
}
