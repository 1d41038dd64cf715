//! Mapping of [`DomainError`] onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::ApiResponse;
use crate::shared::DomainError;

/// Body of a request rejected by the access gate
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyDeniedBody {
    pub success: bool,
    pub error: String,
    pub reason: String,
    pub ip: String,
}

pub fn status_of(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) | DomainError::PolicyDenied { .. } => StatusCode::FORBIDDEN,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Storage(_) | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        let message = match self {
            DomainError::PolicyDenied { reason, ip } => {
                let body = PolicyDeniedBody {
                    success: false,
                    error: "Access denied".to_string(),
                    reason,
                    ip,
                };
                return (status, Json(body)).into_response();
            }
            DomainError::Validation(msg)
            | DomainError::Unauthenticated(msg)
            | DomainError::Forbidden(msg)
            | DomainError::Conflict(msg) => msg,
            DomainError::NotFound { entity, .. } => format!("{} not found", entity),
            DomainError::Storage(detail) | DomainError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn storage_details_stay_server_side() {
        let response = DomainError::Storage("disk I/O error at page 7".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn policy_denial_names_reason_and_ip() {
        let response = DomainError::PolicyDenied {
            reason: "IP address is blocked".into(),
            ip: "10.0.0.5".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["reason"], "IP address is blocked");
        assert_eq!(body["ip"], "10.0.0.5");
    }

    #[test]
    fn statuses() {
        assert_eq!(status_of(&DomainError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(&DomainError::Unauthenticated("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(&DomainError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(&DomainError::not_found("User", "username", "bob")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(&DomainError::Conflict("x".into())), StatusCode::CONFLICT);
    }
}
