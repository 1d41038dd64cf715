//! Create system_logs table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SystemLogs::Level).string_len(16).not_null())
                    .col(ColumnDef::new(SystemLogs::Message).text().not_null())
                    .col(ColumnDef::new(SystemLogs::Username).string_len(64).null())
                    .col(ColumnDef::new(SystemLogs::IpAddress).string_len(64).null())
                    .col(
                        ColumnDef::new(SystemLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_system_logs_timestamp")
                    .table(SystemLogs::Table)
                    .col(SystemLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum SystemLogs {
    Table,
    Id,
    Level,
    Message,
    Username,
    IpAddress,
    Timestamp,
}
