//! IP policy handlers (admin only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    AllowedIpDto, AllowedIpsResponse, BlockedIpDto, BlockedIpsResponse, CreateAllowedIpRequest,
    CreateBlockedIpRequest, SecurityStatsResponse,
};
use crate::application::AccessServices;
use crate::interfaces::http::common::{ApiResponse, MessageResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::DomainResult;

#[utoipa::path(
    get,
    path = "/security/allowed-ips",
    tag = "Security",
    responses(
        (status = 200, description = "Allow-list, newest first", body = AllowedIpsResponse),
        (status = 403, description = "Not an admin", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_allowed_ips(State(services): State<AccessServices>) -> DomainResult<Json<AllowedIpsResponse>> {
    let items = services.ip_policy.list_allowed().await?;
    Ok(Json(AllowedIpsResponse {
        allowed_ips: items.into_iter().map(AllowedIpDto::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/security/allowed-ips",
    tag = "Security",
    request_body = CreateAllowedIpRequest,
    responses(
        (status = 201, description = "IP allow-listed", body = AllowedIpDto),
        (status = 400, description = "Invalid IP address", body = ApiResponse<String>),
        (status = 409, description = "Already allow-listed", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_allowed_ip(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateAllowedIpRequest>,
) -> DomainResult<(StatusCode, Json<AllowedIpDto>)> {
    let entry = services
        .ip_policy
        .allow(&request.ip_address, request.country, request.description, &admin.username)
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[utoipa::path(
    delete,
    path = "/security/allowed-ips/{id}",
    tag = "Security",
    params(("id" = i32, Path, description = "Allow-list entry ID")),
    responses(
        (status = 200, description = "Entry removed", body = MessageResponse),
        (status = 404, description = "No such entry", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_allowed_ip(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> DomainResult<Json<MessageResponse>> {
    services.ip_policy.remove_allowed(id, &admin.username).await?;
    Ok(Json(MessageResponse::ok("IP removed from allow-list")))
}

#[utoipa::path(
    get,
    path = "/security/blocked-ips",
    tag = "Security",
    responses(
        (status = 200, description = "Block-list, newest first", body = BlockedIpsResponse),
        (status = 403, description = "Not an admin", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_blocked_ips(State(services): State<AccessServices>) -> DomainResult<Json<BlockedIpsResponse>> {
    let items = services.ip_policy.list_blocked().await?;
    Ok(Json(BlockedIpsResponse {
        blocked_ips: items.into_iter().map(BlockedIpDto::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/security/blocked-ips",
    tag = "Security",
    request_body = CreateBlockedIpRequest,
    responses(
        (status = 201, description = "IP blocked", body = BlockedIpDto),
        (status = 400, description = "Invalid IP address", body = ApiResponse<String>),
        (status = 409, description = "Already blocked", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn block_ip(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateBlockedIpRequest>,
) -> DomainResult<(StatusCode, Json<BlockedIpDto>)> {
    let entry = services
        .ip_policy
        .block(&request.ip_address, request.reason, &admin.username)
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[utoipa::path(
    delete,
    path = "/security/blocked-ips/{id}",
    tag = "Security",
    params(("id" = i32, Path, description = "Block-list entry ID")),
    responses(
        (status = 200, description = "IP unblocked", body = MessageResponse),
        (status = 404, description = "No such entry", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unblock_ip(
    State(services): State<AccessServices>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> DomainResult<Json<MessageResponse>> {
    services.ip_policy.unblock(id, &admin.username).await?;
    Ok(Json(MessageResponse::ok("IP unblocked")))
}

#[utoipa::path(
    get,
    path = "/security/stats",
    tag = "Security",
    responses(
        (status = 200, description = "Policy and login statistics", body = SecurityStatsResponse),
        (status = 403, description = "Not an admin", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn security_stats(State(services): State<AccessServices>) -> DomainResult<Json<SecurityStatsResponse>> {
    let stats = services.ip_policy.stats().await?;
    Ok(Json(stats.into()))
}
