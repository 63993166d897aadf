//! Create `transaction` table.
//!
//! Amount is numeric(18,2) and constrained positive. Account FKs restrict.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transaction::Table)
                    .if_not_exists()
                    .col(uuid(Transaction::Id).primary_key())
                    .col(string_len(Transaction::Reference, 32).unique_key().not_null())
                    .col(uuid_null(Transaction::FromAccountId))
                    .col(uuid_null(Transaction::ToAccountId))
                    .col(
                        decimal_len(Transaction::Amount, 18, 2)
                            .not_null()
                            .check(Expr::col(Transaction::Amount).gt(0)),
                    )
                    .col(string_len(Transaction::TransactionType, 32).not_null())
                    .col(string_len(Transaction::Status, 32).not_null())
                    .col(string_len(Transaction::Description, 256).not_null())
                    .col(decimal_len_null(Transaction::FromBalanceAfter, 18, 2))
                    .col(decimal_len_null(Transaction::ToBalanceAfter, 18, 2))
                    .col(uuid_null(Transaction::CreatedBy))
                    .col(timestamp_with_time_zone(Transaction::TransactionDate).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_from_account")
                            .from(Transaction::Table, Transaction::FromAccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_to_account")
                            .from(Transaction::Table, Transaction::ToAccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Transaction::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Transaction {
    Table,
    Id,
    Reference,
    FromAccountId,
    ToAccountId,
    Amount,
    TransactionType,
    Status,
    Description,
    FromBalanceAfter,
    ToBalanceAfter,
    CreatedBy,
    TransactionDate,
}

#[derive(DeriveIden)]
enum Account { Table, Id }
