use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: lookups by branch and role
        manager
            .create_index(
                Index::create()
                    .name("idx_user_branch_role")
                    .table(User::Table)
                    .col(User::BranchId)
                    .col(User::Role)
                    .to_owned(),
            )
            .await?;

        // Accounts: by owner and by branch
        manager
            .create_index(
                Index::create()
                    .name("idx_account_user")
                    .table(Account::Table)
                    .col(Account::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_account_branch")
                    .table(Account::Table)
                    .col(Account::BranchId)
                    .to_owned(),
            )
            .await?;

        // Transactions: history per account, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_from_date")
                    .table(Transaction::Table)
                    .col(Transaction::FromAccountId)
                    .col(Transaction::TransactionDate)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_to_date")
                    .table(Transaction::Table)
                    .col(Transaction::ToAccountId)
                    .col(Transaction::TransactionDate)
                    .to_owned(),
            )
            .await?;

        // OTP: latest code per email + purpose
        manager
            .create_index(
                Index::create()
                    .name("idx_otp_email_purpose")
                    .table(OtpVerification::Table)
                    .col(OtpVerification::Email)
                    .col(OtpVerification::Purpose)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_user_branch_role").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_account_user").table(Account::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_account_branch").table(Account::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_transaction_from_date").table(Transaction::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_transaction_to_date").table(Transaction::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_otp_email_purpose").table(OtpVerification::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User { Table, BranchId, Role }

#[derive(DeriveIden)]
enum Account { Table, UserId, BranchId }

#[derive(DeriveIden)]
enum Transaction { Table, FromAccountId, ToAccountId, TransactionDate }

#[derive(DeriveIden)]
enum OtpVerification { Table, Email, Purpose }
