use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::{CountryCount, IpCount, SecurityStats};
use crate::domain::{AllowedIp, BlockedIp};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllowedIpDto {
    pub id: i32,
    pub ip_address: String,
    pub country: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<AllowedIp> for AllowedIpDto {
    fn from(ip: AllowedIp) -> Self {
        Self {
            id: ip.id,
            ip_address: ip.ip_address,
            country: ip.country,
            description: ip.description,
            created_at: ip.created_at,
            is_active: ip.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAllowedIpRequest {
    #[validate(length(min = 1, max = 64, message = "IP address is required"))]
    #[schema(example = "203.0.113.7")]
    pub ip_address: String,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlockedIpDto {
    pub id: i32,
    pub ip_address: String,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
    pub blocked_by: Option<String>,
    pub is_active: bool,
}

impl From<BlockedIp> for BlockedIpDto {
    fn from(ip: BlockedIp) -> Self {
        Self {
            id: ip.id,
            ip_address: ip.ip_address,
            reason: ip.reason,
            blocked_at: ip.blocked_at,
            blocked_by: ip.blocked_by,
            is_active: ip.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBlockedIpRequest {
    #[validate(length(min = 1, max = 64, message = "IP address is required"))]
    #[schema(example = "10.0.0.5")]
    pub ip_address: String,
    /// Defaults to "Blocked by administrator"
    #[validate(length(max = 255))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountryCountDto {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IpCountDto {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub login_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllowedIpsResponse {
    #[serde(rename = "allowedIPs")]
    pub allowed_ips: Vec<AllowedIpDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlockedIpsResponse {
    #[serde(rename = "blockedIPs")]
    pub blocked_ips: Vec<BlockedIpDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityStatsResponse {
    #[serde(rename = "allowedIPs")]
    pub allowed_ips: u64,
    #[serde(rename = "blockedIPs")]
    pub blocked_ips: u64,
    #[serde(rename = "countryDistribution")]
    pub country_distribution: Vec<CountryCountDto>,
    #[serde(rename = "topIPs")]
    pub top_ips: Vec<IpCountDto>,
}

impl From<SecurityStats> for SecurityStatsResponse {
    fn from(stats: SecurityStats) -> Self {
        Self {
            allowed_ips: stats.allowed_ips,
            blocked_ips: stats.blocked_ips,
            country_distribution: stats
                .country_distribution
                .into_iter()
                .map(|CountryCount { country, count }| CountryCountDto { country, count })
                .collect(),
            top_ips: stats
                .top_ips
                .into_iter()
                .map(|c: IpCount| IpCountDto {
                    ip: c.ip,
                    country: c.country,
                    city: c.city,
                    login_count: c.login_count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_use_dashboard_field_names() {
        let body = serde_json::to_value(SecurityStatsResponse {
            allowed_ips: 2,
            blocked_ips: 1,
            country_distribution: vec![],
            top_ips: vec![],
        })
        .unwrap();
        assert_eq!(body["allowedIPs"], 2);
        assert_eq!(body["blockedIPs"], 1);
        assert!(body["countryDistribution"].is_array());
        assert!(body["topIPs"].is_array());
    }
}
