//! Session handlers (admin only)

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::dto::{CleanupResponse, ForceLogoutResponse, LogoutAllResponse, SessionDto, SessionsResponse};
use crate::application::AccessServices;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::{DomainError, DomainResult};

/// One row per user: the most recently active session.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "Sessions",
    responses(
        (status = 200, description = "Active sessions", body = SessionsResponse),
        (status = 401, description = "No token", body = ApiResponse<String>),
        (status = 403, description = "Not an admin", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_sessions(State(services): State<AccessServices>) -> DomainResult<Json<SessionsResponse>> {
    let sessions = services.registry.list_active().await?;
    Ok(Json(SessionsResponse {
        sessions: sessions.into_iter().map(SessionDto::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/sessions/logout/{username}",
    tag = "Sessions",
    params(("username" = String, Path, description = "User to log out")),
    responses(
        (status = 200, description = "Sessions closed", body = ForceLogoutResponse),
        (status = 403, description = "Not an admin, or target is the Admin user", body = ApiResponse<String>),
        (status = 404, description = "No active sessions", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn force_logout(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
) -> DomainResult<Json<ForceLogoutResponse>> {
    let closed = services.lifecycle.logout_user(&username, &admin.username).await?;
    if closed == 0 {
        return Err(DomainError::not_found("Active session", "username", username));
    }
    Ok(Json(ForceLogoutResponse {
        success: true,
        message: format!("User {} has been logged out", username),
        affected_user: username,
        sessions_closed: closed,
    }))
}

/// Every session except the Admin user's.
#[utoipa::path(
    post,
    path = "/sessions/logout-all",
    tag = "Sessions",
    responses(
        (status = 200, description = "Sessions closed", body = LogoutAllResponse),
        (status = 403, description = "Not an admin", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_all(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
) -> DomainResult<Json<LogoutAllResponse>> {
    let closed = services.lifecycle.logout_all(&admin.username).await?;
    Ok(Json(LogoutAllResponse {
        success: true,
        message: "All users have been logged out (except Admin)".to_string(),
        affected_users: closed,
    }))
}

#[utoipa::path(
    post,
    path = "/sessions/cleanup",
    tag = "Sessions",
    responses(
        (status = 200, description = "Stale sessions closed", body = CleanupResponse),
        (status = 403, description = "Not an admin", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn cleanup(State(services): State<AccessServices>) -> DomainResult<Json<CleanupResponse>> {
    let cleaned = services.lifecycle.sweep_stale().await?;
    Ok(Json(CleanupResponse {
        success: true,
        message: format!("Cleaned up {} stale sessions", cleaned),
        cleaned_sessions: cleaned,
    }))
}
