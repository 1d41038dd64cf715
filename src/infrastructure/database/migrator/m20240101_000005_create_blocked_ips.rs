//! Create blocked_ips table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlockedIps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlockedIps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BlockedIps::IpAddress)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(BlockedIps::Reason)
                            .text()
                            .not_null()
                            .default("Blocked by administrator"),
                    )
                    .col(
                        ColumnDef::new(BlockedIps::BlockedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BlockedIps::BlockedBy).string_len(64).null())
                    .col(
                        ColumnDef::new(BlockedIps::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlockedIps::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum BlockedIps {
    Table,
    Id,
    IpAddress,
    Reason,
    BlockedAt,
    BlockedBy,
    IsActive,
}
