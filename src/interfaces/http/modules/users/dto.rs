use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{GetUserDto, User, UserSortField, UserTag};
use crate::interfaces::http::modules::auth::validate_username;
use crate::shared::{DomainError, DomainResult};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub tag: Option<String>,
    pub is_admin: bool,
    /// The non-deletable Admin account
    pub is_bootstrap: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            is_admin: user.is_admin(),
            username: user.username,
            tag: user.tag.map(|t| t.to_string()),
            is_bootstrap: user.is_bootstrap,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3-20 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
    /// One of `RZ`, `LB`, `KR`
    #[schema(example = "RZ")]
    pub tag: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Substring match on the username
    pub q: Option<String>,
    pub tag: Option<String>,
    /// `username`, `tag` or `created_at`
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_order: Option<String>,
}

impl UserListQuery {
    pub fn into_dto(self) -> DomainResult<GetUserDto> {
        let tag = match self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => Some(UserTag::from_str(tag)?),
            None => None,
        };
        let sort_by = match self.sort_by.as_deref() {
            Some(field) => UserSortField::parse(field)
                .ok_or_else(|| DomainError::Validation(format!("Invalid sort field '{}'", field)))?,
            None => UserSortField::default(),
        };
        let descending = match self.sort_order.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("desc") => true,
            Some("asc") => false,
            Some(other) => {
                return Err(DomainError::Validation(format!("Invalid sort order '{}'", other)))
            }
        };

        Ok(GetUserDto {
            search: self.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            tag,
            page: self.page,
            limit: self.limit,
            sort_by,
            descending,
        })
    }
}

/// `null` clears the tag
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTagRequest {
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAdminRequest {
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkUserRequest {
    /// `delete` or `update_tag`
    pub action: String,
    #[validate(length(min = 1, message = "At least one username is required"))]
    pub usernames: Vec<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkUserResponse {
    pub success: bool,
    pub processed: usize,
    pub failed: Vec<String>,
}

/// Parse an optional tag from a request body; blank means none.
pub fn parse_optional_tag(tag: Option<&str>) -> DomainResult<Option<UserTag>> {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => UserTag::from_str(tag).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults_to_newest_first() {
        let dto = UserListQuery::default().into_dto().unwrap();
        assert_eq!(dto.sort_by, UserSortField::CreatedAt);
        assert!(dto.descending);
        assert!(dto.tag.is_none());
    }

    #[test]
    fn list_query_parses_filters() {
        let dto = UserListQuery {
            q: Some(" ali ".into()),
            tag: Some("LB".into()),
            sort_by: Some("username".into()),
            sort_order: Some("ASC".into()),
            ..Default::default()
        }
        .into_dto()
        .unwrap();
        assert_eq!(dto.search.as_deref(), Some("ali"));
        assert_eq!(dto.tag, Some(UserTag::LB));
        assert_eq!(dto.sort_by, UserSortField::Username);
        assert!(!dto.descending);
    }

    #[test]
    fn list_query_rejects_unknown_values() {
        let bad_tag = UserListQuery {
            tag: Some("XX".into()),
            ..Default::default()
        };
        assert!(matches!(bad_tag.into_dto(), Err(DomainError::Validation(_))));

        let bad_sort = UserListQuery {
            sort_by: Some("password_hash".into()),
            ..Default::default()
        };
        assert!(matches!(bad_sort.into_dto(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn optional_tag() {
        assert_eq!(parse_optional_tag(None).unwrap(), None);
        assert_eq!(parse_optional_tag(Some("")).unwrap(), None);
        assert_eq!(parse_optional_tag(Some("KR")).unwrap(), Some(UserTag::KR));
        assert!(parse_optional_tag(Some("kr")).is_err());
    }
}
