use thiserror::Error;

/// Error taxonomy shared by every layer of the access core.
///
/// Each variant maps to exactly one HTTP status at the request boundary
/// (see `interfaces::http::common::error`).
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input (400)
    #[error("Validation: {0}")]
    Validation(String),

    /// Missing or wrong credentials (401)
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Credential present but invalid, revoked, expired or lacking role (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Caller IP rejected by the access policy (403)
    #[error("Access denied: {reason}")]
    PolicyDenied { reason: String, ip: String },

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Already exists: {0}")]
    Conflict(String),

    /// Backing store failure (500). Security decisions depending on the
    /// failed read must deny.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        let msg = e.to_string();
        if msg.contains("UNIQUE") || msg.contains("duplicate") {
            DomainError::Conflict(msg)
        } else {
            DomainError::Storage(msg)
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
