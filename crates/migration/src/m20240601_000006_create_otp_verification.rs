//! Create `otp_verification` table.
//! Codes may exist before the user does (registration), so `user_id` is nullable.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpVerification::Table)
                    .if_not_exists()
                    .col(uuid(OtpVerification::Id).primary_key())
                    .col(uuid_null(OtpVerification::UserId))
                    .col(string_len(OtpVerification::Email, 255).not_null())
                    .col(string_len(OtpVerification::Code, 6).not_null())
                    .col(string_len(OtpVerification::Purpose, 32).not_null())
                    .col(timestamp_with_time_zone(OtpVerification::ExpiresAt).not_null())
                    .col(integer(OtpVerification::AttemptCount).not_null())
                    .col(boolean(OtpVerification::IsVerified).not_null())
                    .col(boolean(OtpVerification::IsUsed).not_null())
                    .col(timestamp_with_time_zone(OtpVerification::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_otp_user")
                            .from(OtpVerification::Table, OtpVerification::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OtpVerification::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OtpVerification {
    Table,
    Id,
    UserId,
    Email,
    Code,
    Purpose,
    ExpiresAt,
    AttemptCount,
    IsVerified,
    IsUsed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
