//! Create active_sessions table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActiveSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActiveSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActiveSessions::Username).string_len(64).not_null())
                    .col(
                        ColumnDef::new(ActiveSessions::Token)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ActiveSessions::Ip).string_len(64).not_null())
                    .col(
                        ColumnDef::new(ActiveSessions::Country)
                            .string_len(100)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(ActiveSessions::City)
                            .string_len(100)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(ActiveSessions::Region)
                            .string_len(100)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(ActiveSessions::Timezone)
                            .string_len(64)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(
                        ColumnDef::new(ActiveSessions::UserAgent)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ActiveSessions::LoginTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActiveSessions::LastActivity)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActiveSessions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-user logout and the admin listing filter on username
        manager
            .create_index(
                Index::create()
                    .name("idx_active_sessions_username")
                    .table(ActiveSessions::Table)
                    .col(ActiveSessions::Username)
                    .to_owned(),
            )
            .await?;

        // Staleness sweep scans live rows by last activity
        manager
            .create_index(
                Index::create()
                    .name("idx_active_sessions_active_last_activity")
                    .table(ActiveSessions::Table)
                    .col(ActiveSessions::IsActive)
                    .col(ActiveSessions::LastActivity)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActiveSessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ActiveSessions {
    Table,
    Id,
    Username,
    Token,
    Ip,
    Country,
    City,
    Region,
    Timezone,
    UserAgent,
    LoginTime,
    LastActivity,
    IsActive,
}
