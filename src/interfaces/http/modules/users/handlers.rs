//! User administration handlers

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    parse_optional_tag, BulkUserRequest, BulkUserResponse, CreateUserRequest, UpdateAdminRequest,
    UpdateTagRequest, UserDto, UserListQuery,
};
use crate::application::{AccessServices, BulkAction, NewUserRequest};
use crate::domain::UserTag;
use crate::interfaces::http::common::{ApiResponse, MessageResponse, PaginatedResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::{DomainError, DomainResult};

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Invalid username, password or tag", body = ApiResponse<String>),
        (status = 403, description = "Not an admin, or name reserved", body = ApiResponse<String>),
        (status = 409, description = "User already exists", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> DomainResult<(StatusCode, Json<UserDto>)> {
    let tag = UserTag::from_str(request.tag.trim())?;
    let user = services
        .users
        .create(
            NewUserRequest {
                username: request.username,
                password: request.password,
                tag,
                is_admin: request.is_admin,
            },
            &admin.username,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Page of users", body = PaginatedResponse<UserDto>),
        (status = 400, description = "Invalid filter", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(services): State<AccessServices>,
    Query(query): Query<UserListQuery>,
) -> DomainResult<Json<PaginatedResponse<UserDto>>> {
    let page = services.users.list(query.into_dto()?).await?;
    Ok(Json(PaginatedResponse::from_result(page, UserDto::from)))
}

#[utoipa::path(
    delete,
    path = "/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "User to delete")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Cannot delete Admin user", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
) -> DomainResult<Json<MessageResponse>> {
    services.users.delete(&username, &admin.username).await?;
    Ok(Json(MessageResponse::ok(format!("User {} deleted", username))))
}

#[utoipa::path(
    put,
    path = "/users/{username}/tag",
    tag = "Users",
    params(("username" = String, Path, description = "User to retag")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Tag updated", body = MessageResponse),
        (status = 403, description = "Cannot modify Admin user tag", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_tag(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
    Json(request): Json<UpdateTagRequest>,
) -> DomainResult<Json<MessageResponse>> {
    let tag = parse_optional_tag(request.tag.as_deref())?;
    services.users.set_tag(&username, tag, &admin.username).await?;
    Ok(Json(MessageResponse::ok("User tag updated")))
}

#[utoipa::path(
    put,
    path = "/users/{username}/admin",
    tag = "Users",
    params(("username" = String, Path, description = "User to promote or demote")),
    request_body = UpdateAdminRequest,
    responses(
        (status = 200, description = "Role updated", body = MessageResponse),
        (status = 403, description = "Cannot change Admin user role", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_admin(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
    Json(request): Json<UpdateAdminRequest>,
) -> DomainResult<Json<MessageResponse>> {
    services
        .users
        .set_admin(&username, request.is_admin, &admin.username)
        .await?;
    let message = if request.is_admin {
        format!("User {} is now an admin", username)
    } else {
        format!("User {} is no longer an admin", username)
    };
    Ok(Json(MessageResponse::ok(message)))
}

#[utoipa::path(
    post,
    path = "/users/bulk",
    tag = "Users",
    request_body = BulkUserRequest,
    responses(
        (status = 200, description = "Per-user outcome", body = BulkUserResponse),
        (status = 400, description = "Unknown action or tag", body = ApiResponse<String>),
        (status = 403, description = "List includes the Admin user", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_users(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<BulkUserRequest>,
) -> DomainResult<Json<BulkUserResponse>> {
    let action = match request.action.as_str() {
        "delete" => BulkAction::Delete,
        "update_tag" => BulkAction::UpdateTag(parse_optional_tag(request.tag.as_deref())?),
        other => return Err(DomainError::Validation(format!("Unknown bulk action '{}'", other))),
    };
    let outcome = services
        .users
        .bulk(action, &request.usernames, &admin.username)
        .await?;
    Ok(Json(BulkUserResponse {
        success: outcome.failed.is_empty(),
        processed: outcome.processed,
        failed: outcome.failed,
    }))
}
