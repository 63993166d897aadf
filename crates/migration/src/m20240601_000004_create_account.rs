//! Create `account` table.
//!
//! Balance is numeric(18,2). Owner and branch FKs restrict deletes, accounts
//! are soft-deleted instead.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(uuid(Account::Id).primary_key())
                    .col(string_len(Account::AccountNumber, 12).unique_key().not_null())
                    .col(uuid(Account::UserId).not_null())
                    .col(uuid(Account::BranchId).not_null())
                    .col(string_len(Account::AccountType, 32).not_null())
                    .col(
                        decimal_len(Account::Balance, 18, 2)
                            .not_null()
                            .check(Expr::col(Account::Balance).gte(0)),
                    )
                    .col(string_len(Account::Status, 32).not_null())
                    .col(boolean(Account::IsDeleted).not_null())
                    .col(uuid_null(Account::CreatedBy))
                    .col(timestamp_with_time_zone(Account::OpenedAt).not_null())
                    .col(timestamp_with_time_zone(Account::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_user")
                            .from(Account::Table, Account::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_branch")
                            .from(Account::Table, Account::BranchId)
                            .to(Branch::Table, Branch::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Account::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
    AccountNumber,
    UserId,
    BranchId,
    AccountType,
    Balance,
    Status,
    IsDeleted,
    CreatedBy,
    OpenedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Branch { Table, Id }
