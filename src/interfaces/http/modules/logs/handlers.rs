//! System audit log view (admin only)

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::AccessServices;
use crate::domain::SystemLogEntry;
use crate::interfaces::http::common::{ApiResponse, PaginatedResponse, PaginationParams};
use crate::shared::DomainResult;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogEntryDto {
    pub id: i32,
    /// `info`, `warn` or `error`
    pub level: String,
    pub message: String,
    pub username: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<SystemLogEntry> for LogEntryDto {
    fn from(entry: SystemLogEntry) -> Self {
        Self {
            id: entry.id,
            level: entry.level.as_str().to_string(),
            message: entry.message,
            username: entry.username,
            ip_address: entry.ip_address,
            timestamp: entry.timestamp,
        }
    }
}

#[utoipa::path(
    get,
    path = "/logs",
    tag = "Logs",
    params(PaginationParams),
    responses(
        (status = 200, description = "Log entries, newest first", body = PaginatedResponse<LogEntryDto>),
        (status = 403, description = "Not an admin", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_logs(
    State(services): State<AccessServices>,
    Query(params): Query<PaginationParams>,
) -> DomainResult<Json<PaginatedResponse<LogEntryDto>>> {
    let page = services
        .audit
        .list(params.page.unwrap_or(1), params.limit.unwrap_or(50))
        .await?;
    Ok(Json(PaginatedResponse::from_result(page, LogEntryDto::from)))
}
