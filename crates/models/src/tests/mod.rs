//! Persistence-level tests against a real PostgreSQL.
//!
//! Skipped unless `DATABASE_URL` is set (and `SKIP_DB_TESTS` is not).

use chrono::Utc;
use migration::MigratorTrait;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::db::{connect, is_unique_violation};
use crate::enums::{AccountStatus, AccountType, BranchType, UserRole, UserStatus};
use crate::{account, branch, transaction, user, user_credentials};

static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn db_tests_enabled() -> bool {
    let _ = dotenvy::dotenv();
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect().await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;
    connect().await
}

fn short_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}

fn digits(n: usize) -> String {
    let raw: String = Uuid::new_v4().as_u128().to_string();
    format!("5{}", &raw[..n - 1])
}

async fn insert_branch(db: &DatabaseConnection, code: &str, ifsc: &str) -> Result<branch::Model, sea_orm::DbErr> {
    let now = Utc::now().into();
    branch::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        name: Set("Test Branch".into()),
        ifsc: Set(ifsc.to_string()),
        branch_type: Set(BranchType::Urban.as_str().into()),
        address: Set("1 MG Road".into()),
        city: Set("Pune".into()),
        state: Set("Maharashtra".into()),
        phone: Set("9876543210".into()),
        is_active: Set(true),
        is_deleted: Set(false),
        created_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

async fn insert_user(db: &DatabaseConnection, branch_id: Uuid) -> Result<user::Model, sea_orm::DbErr> {
    let now = Utc::now().into();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("db_{}@example.com", Uuid::new_v4())),
        full_name: Set("Db User".into()),
        phone: Set("9876543210".into()),
        role: Set(UserRole::Customer.as_str().into()),
        status: Set(UserStatus::Active.as_str().into()),
        branch_id: Set(Some(branch_id)),
        date_of_birth: Set(None),
        address: Set(None),
        pan_number: Set(None),
        aadhaar_number: Set(None),
        kyc_verified: Set(false),
        email_verified: Set(true),
        is_deleted: Set(false),
        created_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

async fn insert_account(db: &DatabaseConnection, number: &str, user_id: Uuid, branch_id: Uuid) -> Result<account::Model, sea_orm::DbErr> {
    let now = Utc::now().into();
    account::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_number: Set(number.to_string()),
        user_id: Set(user_id),
        branch_id: Set(branch_id),
        account_type: Set(AccountType::Savings.as_str().into()),
        balance: Set(dec!(1500.00)),
        status: Set(AccountStatus::Active.as_str().into()),
        is_deleted: Set(false),
        created_by: Set(None),
        opened_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

#[tokio::test]
async fn duplicate_branch_code_rejected() -> anyhow::Result<()> {
    if !db_tests_enabled() { return Ok(()); }
    let db = setup_test_db().await?;

    let code = short_code();
    let first = insert_branch(&db, &code, &format!("TEST0{}", short_code())).await?;
    let err = insert_branch(&db, &code, &format!("TEST0{}", short_code())).await.unwrap_err();
    assert!(is_unique_violation(&err), "expected unique violation, got {err}");

    branch::Entity::delete_by_id(first.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_account_number_rejected() -> anyhow::Result<()> {
    if !db_tests_enabled() { return Ok(()); }
    let db = setup_test_db().await?;

    let b = insert_branch(&db, &short_code(), &format!("TEST0{}", short_code())).await?;
    let u = insert_user(&db, b.id).await?;
    let number = digits(12);
    let a = insert_account(&db, &number, u.id, b.id).await?;
    let err = insert_account(&db, &number, u.id, b.id).await.unwrap_err();
    assert!(is_unique_violation(&err));

    account::Entity::delete_by_id(a.id).exec(&db).await?;
    user::Entity::delete_by_id(u.id).exec(&db).await?;
    branch::Entity::delete_by_id(b.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn non_positive_transaction_amount_rejected() -> anyhow::Result<()> {
    if !db_tests_enabled() { return Ok(()); }
    let db = setup_test_db().await?;

    let b = insert_branch(&db, &short_code(), &format!("TEST0{}", short_code())).await?;
    let u = insert_user(&db, b.id).await?;
    let a = insert_account(&db, &digits(12), u.id, b.id).await?;

    let res = transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        reference: Set(format!("TXN{}", short_code())),
        from_account_id: Set(None),
        to_account_id: Set(Some(a.id)),
        amount: Set(dec!(0)),
        transaction_type: Set("Deposit".into()),
        status: Set("Completed".into()),
        description: Set(String::new()),
        from_balance_after: Set(None),
        to_balance_after: Set(Some(a.balance)),
        created_by: Set(None),
        transaction_date: Set(Utc::now().into()),
    }
    .insert(&db)
    .await;
    assert!(res.is_err(), "amount check constraint must reject 0");

    account::Entity::delete_by_id(a.id).exec(&db).await?;
    user::Entity::delete_by_id(u.id).exec(&db).await?;
    branch::Entity::delete_by_id(b.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn soft_deleted_user_hidden_from_live_queries() -> anyhow::Result<()> {
    if !db_tests_enabled() { return Ok(()); }
    let db = setup_test_db().await?;

    let b = insert_branch(&db, &short_code(), &format!("TEST0{}", short_code())).await?;
    let u = insert_user(&db, b.id).await?;
    let mut gone: user::ActiveModel = u.clone().into();
    gone.is_deleted = Set(true);
    gone.status = Set(UserStatus::Inactive.as_str().to_string());
    gone.update(&db).await?;

    use sea_orm::{ColumnTrait, QueryFilter};
    let live = user::find_live().filter(user::Column::Id.eq(u.id)).one(&db).await?;
    assert!(live.is_none());
    let raw = user::Entity::find_by_id(u.id).one(&db).await?.expect("row kept");
    assert!(raw.is_deleted);

    user::Entity::delete_by_id(u.id).exec(&db).await?;
    branch::Entity::delete_by_id(b.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn password_upsert_keeps_one_row_per_user() -> anyhow::Result<()> {
    if !db_tests_enabled() { return Ok(()); }
    let db = setup_test_db().await?;

    let b = insert_branch(&db, &short_code(), &format!("TEST0{}", short_code())).await?;
    let u = insert_user(&db, b.id).await?;
    let first = user_credentials::upsert_password(&db, u.id, "hash-one".into(), "argon2").await?;
    let second = user_credentials::upsert_password(&db, u.id, "hash-two".into(), "argon2").await?;
    assert_eq!(first.id, second.id);
    assert_eq!(second.password_hash, "hash-two");

    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};
    let rows = user_credentials::Entity::find().filter(user_credentials::Column::UserId.eq(u.id)).count(&db).await?;
    assert_eq!(rows, 1);

    user_credentials::Entity::delete_by_id(first.id).exec(&db).await?;
    user::Entity::delete_by_id(u.id).exec(&db).await?;
    branch::Entity::delete_by_id(b.id).exec(&db).await?;
    Ok(())
}
