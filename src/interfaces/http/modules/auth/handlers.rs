//! Authentication handlers

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use super::dto::{
    LoginRequest, LoginResponse, LoginUser, TokenRequest, TokenStatusResponse, VerifyResponse,
};
use crate::application::{AccessServices, ClientContext, TokenStatus};
use crate::interfaces::http::common::{ApiResponse, MessageResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::{DomainError, DomainResult};

#[utoipa::path(
    post,
    path = "/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Malformed credentials", body = ApiResponse<String>),
        (status = 401, description = "Invalid credentials", body = ApiResponse<String>),
        (status = 403, description = "Caller IP denied")
    )
)]
pub async fn login(
    State(services): State<AccessServices>,
    Extension(client): Extension<ClientContext>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> DomainResult<Json<LoginResponse>> {
    let outcome = services
        .lifecycle
        .login(&request.username, &request.password, &client)
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        token_type: "Bearer".to_string(),
        expires_in: outcome.expires_in,
        user: LoginUser {
            is_admin: outcome.user.is_admin(),
            tag: outcome.user.tag.map(|t| t.to_string()),
            username: outcome.user.username,
            location: outcome.geo.label(),
        },
    }))
}

/// Public token check. Never fails on a bad token, only on a missing one.
#[utoipa::path(
    post,
    path = "/verify",
    tag = "Authentication",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyResponse),
        (status = 400, description = "Token missing", body = ApiResponse<String>)
    )
)]
pub async fn verify(
    State(services): State<AccessServices>,
    Json(request): Json<TokenRequest>,
) -> DomainResult<Json<VerifyResponse>> {
    let token = request
        .token()
        .ok_or_else(|| DomainError::Validation("Token required".into()))?;

    let response = match services.lifecycle.inspect(token).await? {
        TokenStatus::Valid(claims) => VerifyResponse {
            valid: true,
            user: Some(claims.username),
            revoked: None,
        },
        TokenStatus::Revoked => VerifyResponse {
            valid: false,
            user: None,
            revoked: Some(true),
        },
        TokenStatus::Invalid => VerifyResponse {
            valid: false,
            user: None,
            revoked: None,
        },
    };
    Ok(Json(response))
}

/// Revoke the given token and end its session.
#[utoipa::path(
    post,
    path = "/logout-user",
    tag = "Authentication",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 400, description = "Token missing", body = ApiResponse<String>)
    )
)]
pub async fn logout(
    State(services): State<AccessServices>,
    Extension(client): Extension<ClientContext>,
    Json(request): Json<TokenRequest>,
) -> DomainResult<Json<MessageResponse>> {
    let token = request
        .token()
        .ok_or_else(|| DomainError::Validation("Token required".into()))?;
    services.lifecycle.logout(token, &client).await?;
    Ok(Json(MessageResponse::ok("Logged out successfully")))
}

#[utoipa::path(
    get,
    path = "/token-status",
    tag = "Authentication",
    responses(
        (status = 200, description = "Token is valid", body = TokenStatusResponse),
        (status = 401, description = "No token", body = ApiResponse<String>),
        (status = 403, description = "Token invalid, expired or revoked", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn token_status(Extension(user): Extension<AuthenticatedUser>) -> Json<TokenStatusResponse> {
    Json(TokenStatusResponse {
        valid: true,
        user: user.username,
        timestamp: Utc::now(),
    })
}
