//! Service flows over the SeaORM repositories.
//!
//! Skipped unless `DATABASE_URL` is set (and `SKIP_DB_TESTS` is not).

use std::sync::Arc;

use models::enums::{AccountStatus, AccountType, BranchType, UserRole};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::account::domain::{OpenAccountInput, UpdateAccountStatusInput};
use crate::account::seaorm::SeaOrmAccountRepository;
use crate::account::AccountService;
use crate::branch::domain::CreateBranchInput;
use crate::branch::seaorm::SeaOrmBranchRepository;
use crate::branch::BranchService;
use crate::context::Actor;
use crate::errors::ServiceError;
use crate::test_support::{db_tests_enabled, get_db};
use crate::transaction::domain::{DepositInput, TransferInput, WithdrawInput};
use crate::transaction::seaorm::SeaOrmTransactionRepository;
use crate::transaction::TransactionService;
use crate::user::repository::UserRepository;
use crate::user::seaorm::SeaOrmUserRepository;
use crate::user::service::{hash, new_user, PASSWORD_ALGORITHM};
use crate::user::UserService;

fn unique(prefix: &str, len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", prefix, &hex[..len])
}

fn branch_input() -> CreateBranchInput {
    CreateBranchInput {
        code: unique("T", 6),
        name: "Test Branch".into(),
        ifsc: format!("TEST0{}", unique("", 6)),
        branch_type: BranchType::Urban,
        address: "1 MG Road".into(),
        city: "Pune".into(),
        state: "Maharashtra".into(),
        phone: "9876543210".into(),
    }
}

struct Ctx {
    branches: BranchService,
    users: UserService,
    accounts: AccountService,
    txns: Arc<TransactionService>,
    user_repo: Arc<SeaOrmUserRepository>,
    admin: Actor,
}

async fn ctx() -> anyhow::Result<Ctx> {
    let db = get_db().await?;
    let branch_repo = Arc::new(SeaOrmBranchRepository { db: db.clone() });
    let user_repo = Arc::new(SeaOrmUserRepository { db: db.clone() });
    let account_repo = Arc::new(SeaOrmAccountRepository { db: db.clone() });
    let txn_repo = Arc::new(SeaOrmTransactionRepository { db });
    Ok(Ctx {
        branches: BranchService::new(branch_repo.clone()),
        users: UserService::new(user_repo.clone(), branch_repo.clone()),
        accounts: AccountService::new(account_repo.clone(), user_repo.clone(), branch_repo),
        user_repo,
        txns: Arc::new(TransactionService::new(account_repo, txn_repo)),
        admin: Actor::new(Uuid::new_v4(), UserRole::Admin, None),
    })
}

/// A fresh branch with one customer; returns the customer as an actor.
async fn customer(c: &Ctx) -> anyhow::Result<Actor> {
    let branch = c.branches.create(&c.admin, branch_input()).await?;
    let email = format!("{}@test.bank.in", unique("c", 10).to_lowercase());
    let u = new_user(email, "Test Customer".into(), "9876543210".into(), UserRole::Customer, Some(branch.id), None);
    let u = c.user_repo.create(u, hash("Passw0rd!")?, PASSWORD_ALGORITHM.into()).await?;
    Ok(Actor::new(u.id, UserRole::Customer, Some(branch.id)))
}

#[tokio::test]
async fn duplicate_branch_code_conflicts() -> anyhow::Result<()> {
    if !db_tests_enabled() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let c = ctx().await?;
    let input = branch_input();
    c.branches.create(&c.admin, input.clone()).await?;
    let mut again = branch_input();
    again.code = input.code;
    let err = c.branches.create(&c.admin, again).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn transfer_and_concurrent_withdrawals() -> anyhow::Result<()> {
    if !db_tests_enabled() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let c = ctx().await?;
    let actor = customer(&c).await?;
    assert_eq!(c.users.get(&c.admin, actor.user_id).await?.role, UserRole::Customer);
    let open = |deposit| OpenAccountInput { user_id: None, branch_id: None, account_type: AccountType::Salary, initial_deposit: deposit };
    let a = c.accounts.open(&actor, open(dec!(10000))).await?;
    let b = c.accounts.open(&actor, open(dec!(0))).await?;

    c.txns
        .transfer(&actor, TransferInput { from_account_id: a.id, to_account_id: Some(b.id), to_account_number: None, amount: dec!(2500), description: None })
        .await?;
    assert_eq!(c.accounts.get(&c.admin, a.id).await?.balance, dec!(7500));
    assert_eq!(c.accounts.get(&c.admin, b.id).await?.balance, dec!(2500));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let txns = c.txns.clone();
        let actor = actor.clone();
        let id = a.id;
        handles.push(tokio::spawn(async move {
            txns.withdraw(&actor, WithdrawInput { account_id: id, amount: dec!(1000), description: None }).await.is_ok()
        }));
    }
    let mut ok = 0;
    for h in handles {
        if h.await? {
            ok += 1;
        }
    }
    assert_eq!(ok, 7);
    assert_eq!(c.accounts.get(&c.admin, a.id).await?.balance, dec!(500));
    Ok(())
}

#[tokio::test]
async fn status_writes_never_roll_back_deposits() -> anyhow::Result<()> {
    if !db_tests_enabled() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let c = ctx().await?;
    let actor = customer(&c).await?;
    let acc = c
        .accounts
        .open(&actor, OpenAccountInput { user_id: None, branch_id: None, account_type: AccountType::Savings, initial_deposit: dec!(10000) })
        .await?;

    for _ in 0..5 {
        let (deposited, status) = tokio::join!(
            c.txns.deposit(&actor, DepositInput { account_id: acc.id, amount: dec!(100), description: None }),
            c.accounts.update_status(&c.admin, acc.id, UpdateAccountStatusInput { status: AccountStatus::Active }),
        );
        deposited?;
        status?;
    }
    assert_eq!(c.accounts.get(&c.admin, acc.id).await?.balance, dec!(10500));

    let close = c.accounts.update_status(&c.admin, acc.id, UpdateAccountStatusInput { status: AccountStatus::Closed }).await;
    assert!(matches!(close, Err(ServiceError::Rule(_))));
    Ok(())
}
