use super::UserTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
    Username,
    Tag,
    #[default]
    CreatedAt,
}

impl UserSortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "username" => Some(Self::Username),
            "tag" => Some(Self::Tag),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetUserDto {
    pub search: Option<String>,
    pub tag: Option<UserTag>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: UserSortField,
    pub descending: bool,
}
