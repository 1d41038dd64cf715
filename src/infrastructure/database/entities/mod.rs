//! Database entities module

pub mod active_session;
pub mod allowed_ip;
pub mod blocked_ip;
pub mod revoked_token;
pub mod system_log;
pub mod user;

pub use active_session::Entity as ActiveSession;
pub use allowed_ip::Entity as AllowedIp;
pub use blocked_ip::Entity as BlockedIp;
pub use revoked_token::Entity as RevokedToken;
pub use system_log::Entity as SystemLog;
pub use user::Entity as User;
