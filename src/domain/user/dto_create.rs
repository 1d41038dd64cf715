use super::{UserRole, UserTag};

/// Insert payload. The password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub tag: Option<UserTag>,
    pub is_bootstrap: bool,
}
