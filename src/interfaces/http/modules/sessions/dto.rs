use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ActiveSessionView;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDto {
    pub username: String,
    pub user_id: i32,
    pub tag: Option<String>,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ip: String,
    /// `"city, country"`
    pub location: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub user_agent: String,
    pub status: String,
}

impl From<ActiveSessionView> for SessionDto {
    fn from(view: ActiveSessionView) -> Self {
        let session = view.session;
        Self {
            location: session.geo.label(),
            username: session.username,
            user_id: view.user_id,
            tag: view.tag.map(|t| t.to_string()),
            login_time: session.login_time,
            last_activity: session.last_activity,
            ip: session.ip_address,
            country: session.geo.country,
            city: session.geo.city,
            region: session.geo.region,
            timezone: session.geo.timezone,
            user_agent: session.user_agent,
            status: "online".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForceLogoutResponse {
    pub success: bool,
    pub message: String,
    pub affected_user: String,
    pub sessions_closed: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutAllResponse {
    pub success: bool,
    pub message: String,
    pub affected_users: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub cleaned_sessions: u64,
}
