//! Create allowed_ips table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AllowedIps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AllowedIps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AllowedIps::IpAddress)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AllowedIps::Country).string_len(100).null())
                    .col(ColumnDef::new(AllowedIps::Description).text().null())
                    .col(
                        ColumnDef::new(AllowedIps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AllowedIps::IsActive)
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
            .drop_table(Table::drop().table(AllowedIps::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum AllowedIps {
    Table,
    Id,
    IpAddress,
    Country,
    Description,
    CreatedAt,
    IsActive,
}
