//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_revoked_tokens;
mod m20240101_000003_create_active_sessions;
mod m20240101_000004_create_allowed_ips;
mod m20240101_000005_create_blocked_ips;
mod m20240101_000006_create_system_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_revoked_tokens::Migration),
            Box::new(m20240101_000003_create_active_sessions::Migration),
            Box::new(m20240101_000004_create_allowed_ips::Migration),
            Box::new(m20240101_000005_create_blocked_ips::Migration),
            Box::new(m20240101_000006_create_system_logs::Migration),
        ]
    }
}
