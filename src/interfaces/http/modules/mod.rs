//! HTTP endpoint modules, one per resource

pub mod auth;
pub mod health;
pub mod logs;
pub mod metrics;
pub mod request_id;
pub mod security;
pub mod sessions;
pub mod users;
