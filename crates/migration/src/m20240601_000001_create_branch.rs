//! Create `branch` table.
//!
//! Branch code and IFSC are unique; rows are soft-deleted.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Branch::Table)
                    .if_not_exists()
                    .col(uuid(Branch::Id).primary_key())
                    .col(string_len(Branch::Code, 10).unique_key().not_null())
                    .col(string_len(Branch::Name, 128).not_null())
                    .col(string_len(Branch::Ifsc, 11).unique_key().not_null())
                    .col(string_len(Branch::BranchType, 32).not_null())
                    .col(string_len(Branch::Address, 256).not_null())
                    .col(string_len(Branch::City, 64).not_null())
                    .col(string_len(Branch::State, 64).not_null())
                    .col(string_len(Branch::Phone, 20).not_null())
                    .col(boolean(Branch::IsActive).not_null())
                    .col(boolean(Branch::IsDeleted).not_null())
                    .col(uuid_null(Branch::CreatedBy))
                    .col(timestamp_with_time_zone(Branch::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Branch::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Branch::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Branch {
    Table,
    Id,
    Code,
    Name,
    Ifsc,
    BranchType,
    Address,
    City,
    State,
    Phone,
    IsActive,
    IsDeleted,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
