//! Create `user` table with nullable FK to `branch`.
//!
//! Stores staff and customers, including KYC fields; rows are soft-deleted.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).unique_key().not_null())
                    .col(string_len(User::FullName, 128).not_null())
                    .col(string_len(User::Phone, 20).not_null())
                    .col(string_len(User::Role, 32).not_null())
                    .col(string_len(User::Status, 32).not_null())
                    .col(uuid_null(User::BranchId))
                    .col(date_null(User::DateOfBirth))
                    .col(string_len_null(User::Address, 256))
                    .col(string_len_null(User::PanNumber, 10))
                    .col(string_len_null(User::AadhaarNumber, 12))
                    .col(boolean(User::KycVerified).not_null())
                    .col(boolean(User::EmailVerified).not_null())
                    .col(boolean(User::IsDeleted).not_null())
                    .col(uuid_null(User::CreatedBy))
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_branch")
                            .from(User::Table, User::BranchId)
                            .to(Branch::Table, Branch::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    FullName,
    Phone,
    Role,
    Status,
    BranchId,
    DateOfBirth,
    Address,
    PanNumber,
    AadhaarNumber,
    KycVerified,
    EmailVerified,
    IsDeleted,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Branch { Table, Id }
