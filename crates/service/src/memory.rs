//! In-memory implementation of every repository trait.
//!
//! Backs unit tests and the HTTP tests of the server crate. One lock guards
//! the whole bank, so postings are atomic the same way a database
//! transaction makes them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use models::enums::{AccountStatus, AccountType, BranchType, OtpPurpose, UserRole, UserStatus};
use models::{account, branch, otp_verification, transaction, user};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::account::domain::{generate_account_number, AccountSummary, StatusChange};
use crate::account::repository::AccountRepository;
use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::branch::repository::BranchRepository;
use crate::errors::ServiceError;
use crate::otp::repository::OtpRepository;
use crate::pagination::Pagination;
use crate::transaction::domain::{Posting, TransactionStats};
use crate::transaction::repository::TransactionRepository;
use crate::user::domain::UserFilter;
use crate::user::repository::UserRepository;

#[derive(Default)]
struct State {
    branches: HashMap<Uuid, branch::Model>,
    users: HashMap<Uuid, user::Model>,
    credentials: HashMap<Uuid, Credentials>,
    accounts: HashMap<Uuid, account::Model>,
    /// Insertion order is posting order.
    transactions: Vec<transaction::Model>,
    otps: Vec<otp_verification::Model>,
}

impl State {
    fn live_user(&self, id: Uuid) -> Option<&user::Model> {
        self.users.get(&id).filter(|u| !u.is_deleted)
    }

    fn live_account(&self, id: Uuid) -> Option<&account::Model> {
        self.accounts.get(&id).filter(|a| !a.is_deleted)
    }

    fn open_accounts(&self, pred: impl Fn(&account::Model) -> bool) -> u64 {
        self.accounts
            .values()
            .filter(|a| !a.is_deleted && a.status != AccountStatus::Closed.as_str() && pred(a))
            .count() as u64
    }
}

#[derive(Default)]
pub struct InMemoryBank {
    state: Mutex<State>,
}

fn auth_user(u: &user::Model) -> Result<AuthUser, AuthError> {
    Ok(AuthUser {
        id: u.id,
        email: u.email.clone(),
        name: u.full_name.clone(),
        role: u.role().map_err(|e| AuthError::Repository(e.to_string()))?,
        status: u.status().map_err(|e| AuthError::Repository(e.to_string()))?,
        branch_id: u.branch_id,
    })
}

fn newest_first<T: Clone>(items: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    items.rev().collect()
}

impl InMemoryBank {
    pub fn new() -> Self { Self::default() }

    pub async fn seed_branch(&self, code: &str, ifsc: &str) -> branch::Model {
        let now = Utc::now().into();
        let b = branch::Model {
            id: Uuid::new_v4(),
            code: code.into(),
            name: format!("{} branch", code),
            ifsc: ifsc.into(),
            branch_type: BranchType::Urban.as_str().into(),
            address: "1 Main Road".into(),
            city: "Mumbai".into(),
            state: "Maharashtra".into(),
            phone: "9876543210".into(),
            is_active: true,
            is_deleted: false,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.branches.insert(b.id, b.clone());
        b
    }

    /// An active, verified user with a hashed password.
    ///
    /// Panics if hashing fails; only meant for fixtures.
    pub async fn seed_user(&self, email: &str, name: &str, role: UserRole, branch_id: Option<Uuid>, password: &str) -> user::Model {
        let hash = crate::auth::service::hash_password(password).expect("hash fixture password");
        let mut u = crate::user::service::new_user(email.to_ascii_lowercase(), name.into(), "9876543210".into(), role, branch_id, None);
        if role == UserRole::Customer {
            u.pan_number = Some("ABCDE1234F".into());
            u.aadhaar_number = Some("234567890123".into());
        }
        let mut s = self.state.lock().await;
        s.credentials.insert(u.id, Credentials { user_id: u.id, password_hash: hash, password_algorithm: "argon2".into() });
        s.users.insert(u.id, u.clone());
        u
    }

    pub async fn seed_account(&self, user_id: Uuid, branch_id: Uuid, kind: AccountType, balance: Decimal) -> account::Model {
        let now = Utc::now().into();
        let a = account::Model {
            id: Uuid::new_v4(),
            account_number: generate_account_number(),
            user_id,
            branch_id,
            account_type: kind.as_str().into(),
            balance,
            status: AccountStatus::Active.as_str().into(),
            is_deleted: false,
            created_by: None,
            opened_at: now,
            updated_at: now,
        };
        self.state.lock().await.accounts.insert(a.id, a.clone());
        a
    }

    pub async fn set_user_status(&self, id: Uuid, status: UserStatus) {
        if let Some(u) = self.state.lock().await.users.get_mut(&id) {
            u.status = status.as_str().into();
        }
    }

    pub async fn set_account_status(&self, id: Uuid, status: AccountStatus) {
        if let Some(a) = self.state.lock().await.accounts.get_mut(&id) {
            a.status = status.as_str().into();
        }
    }

    /// Zero the balance and close.
    pub async fn close_account(&self, id: Uuid) {
        if let Some(a) = self.state.lock().await.accounts.get_mut(&id) {
            a.balance = Decimal::ZERO;
            a.status = AccountStatus::Closed.as_str().into();
        }
    }

    pub async fn account(&self, id: Uuid) -> Option<account::Model> {
        self.state.lock().await.accounts.get(&id).cloned()
    }

    pub async fn transactions_for(&self, account_id: Uuid) -> Vec<transaction::Model> {
        self.state.lock().await.transactions.iter().filter(|t| t.touches(account_id)).cloned().collect()
    }
}

#[async_trait]
impl AuthRepository for InMemoryBank {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let s = self.state.lock().await;
        s.users.values().find(|u| !u.is_deleted && u.email == email).map(auth_user).transpose()
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        self.state.lock().await.live_user(id).map(auth_user).transpose()
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        Ok(self.state.lock().await.credentials.get(&user_id).cloned())
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = Credentials { user_id, password_hash, password_algorithm };
        self.state.lock().await.credentials.insert(user_id, c.clone());
        Ok(c)
    }
}

#[async_trait]
impl OtpRepository for InMemoryBank {
    async fn invalidate_open(&self, email: &str, purpose: OtpPurpose) -> Result<u64, ServiceError> {
        let mut s = self.state.lock().await;
        let mut n = 0;
        for o in s.otps.iter_mut().filter(|o| o.email == email && o.purpose == purpose.as_str() && !o.is_used) {
            o.is_used = true;
            n += 1;
        }
        Ok(n)
    }

    async fn insert(&self, otp: otp_verification::Model) -> Result<otp_verification::Model, ServiceError> {
        self.state.lock().await.otps.push(otp.clone());
        Ok(otp)
    }

    async fn latest_open(&self, email: &str, purpose: OtpPurpose) -> Result<Option<otp_verification::Model>, ServiceError> {
        let s = self.state.lock().await;
        Ok(s.otps.iter().rev().find(|o| o.email == email && o.purpose == purpose.as_str() && !o.is_used).cloned())
    }

    async fn record_attempt(&self, id: Uuid, max_attempts: i32) -> Result<bool, ServiceError> {
        let mut s = self.state.lock().await;
        let otp = s.otps.iter_mut().find(|o| o.id == id).ok_or_else(|| ServiceError::not_found("otp"))?;
        if otp.attempt_count >= max_attempts {
            return Ok(false);
        }
        otp.attempt_count += 1;
        Ok(true)
    }

    async fn mark_verified(&self, id: Uuid, max_attempts: i32) -> Result<bool, ServiceError> {
        let mut s = self.state.lock().await;
        let otp = s.otps.iter_mut().find(|o| o.id == id).ok_or_else(|| ServiceError::not_found("otp"))?;
        if otp.is_used || otp.attempt_count >= max_attempts {
            return Ok(false);
        }
        otp.is_verified = true;
        Ok(true)
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, ServiceError> {
        let mut s = self.state.lock().await;
        let otp = s.otps.iter_mut().find(|o| o.id == id).ok_or_else(|| ServiceError::not_found("otp"))?;
        if !otp.is_verified || otp.is_used {
            return Ok(false);
        }
        otp.is_used = true;
        Ok(true)
    }
}

#[async_trait]
impl BranchRepository for InMemoryBank {
    async fn insert(&self, b: branch::Model) -> Result<branch::Model, ServiceError> {
        let mut s = self.state.lock().await;
        if s.branches.values().any(|x| x.code == b.code || x.ifsc == b.ifsc) {
            return Err(ServiceError::Conflict("branch code or IFSC already exists".into()));
        }
        s.branches.insert(b.id, b.clone());
        Ok(b)
    }

    async fn find(&self, id: Uuid) -> Result<Option<branch::Model>, ServiceError> {
        Ok(self.state.lock().await.branches.get(&id).filter(|b| !b.is_deleted).cloned())
    }

    async fn code_or_ifsc_taken(&self, code: &str, ifsc: &str) -> Result<bool, ServiceError> {
        Ok(self.state.lock().await.branches.values().any(|b| b.code == code || b.ifsc == ifsc))
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<branch::Model>, ServiceError> {
        let s = self.state.lock().await;
        let mut out: Vec<_> = s.branches.values().filter(|b| !b.is_deleted && (include_inactive || b.is_active)).cloned().collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(out)
    }

    async fn update(&self, b: branch::Model) -> Result<branch::Model, ServiceError> {
        let mut s = self.state.lock().await;
        let slot = s.branches.get_mut(&b.id).ok_or_else(|| ServiceError::not_found("branch"))?;
        *slot = b.clone();
        Ok(b)
    }

    async fn count_open_accounts(&self, branch_id: Uuid) -> Result<u64, ServiceError> {
        Ok(self.state.lock().await.open_accounts(|a| a.branch_id == branch_id))
    }
}

#[async_trait]
impl UserRepository for InMemoryBank {
    async fn create(&self, u: user::Model, password_hash: String, password_algorithm: String) -> Result<user::Model, ServiceError> {
        let mut s = self.state.lock().await;
        if s.users.values().any(|x| x.email == u.email) {
            return Err(ServiceError::Conflict("email already exists".into()));
        }
        s.credentials.insert(u.id, Credentials { user_id: u.id, password_hash, password_algorithm });
        s.users.insert(u.id, u.clone());
        Ok(u)
    }

    async fn find(&self, id: Uuid) -> Result<Option<user::Model>, ServiceError> {
        Ok(self.state.lock().await.live_user(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(self.state.lock().await.users.values().find(|u| !u.is_deleted && u.email == email).cloned())
    }

    async fn email_taken(&self, email: &str) -> Result<bool, ServiceError> {
        Ok(self.state.lock().await.users.values().any(|u| u.email == email))
    }

    async fn list(&self, filter: &UserFilter, page: Pagination) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let s = self.state.lock().await;
        let mut all: Vec<_> = s.users.values().filter(|u| !u.is_deleted && filter.matches(u)).cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as u64;
        Ok((page.slice(&all), total))
    }

    async fn update(&self, u: user::Model) -> Result<user::Model, ServiceError> {
        let mut s = self.state.lock().await;
        let slot = s.users.get_mut(&u.id).ok_or_else(|| ServiceError::not_found("user"))?;
        *slot = u.clone();
        Ok(u)
    }

    async fn count_open_accounts(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Ok(self.state.lock().await.open_accounts(|a| a.user_id == user_id))
    }

    async fn count_by_role(&self, role: UserRole, branch_id: Option<Uuid>) -> Result<u64, ServiceError> {
        let s = self.state.lock().await;
        Ok(s.users
            .values()
            .filter(|u| !u.is_deleted && u.role == role.as_str() && (branch_id.is_none() || u.branch_id == branch_id))
            .count() as u64)
    }
}

#[async_trait]
impl AccountRepository for InMemoryBank {
    async fn open(&self, a: account::Model, opening: Option<transaction::Model>) -> Result<account::Model, ServiceError> {
        let mut s = self.state.lock().await;
        if s.accounts.values().any(|x| x.account_number == a.account_number) {
            return Err(ServiceError::Conflict("account number already exists".into()));
        }
        s.accounts.insert(a.id, a.clone());
        s.transactions.extend(opening);
        Ok(a)
    }

    async fn find(&self, id: Uuid) -> Result<Option<account::Model>, ServiceError> {
        Ok(self.state.lock().await.live_account(id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<account::Model>, ServiceError> {
        let s = self.state.lock().await;
        Ok(s.accounts.values().find(|a| !a.is_deleted && a.account_number == number).cloned())
    }

    async fn number_exists(&self, number: &str) -> Result<bool, ServiceError> {
        Ok(self.state.lock().await.accounts.values().any(|a| a.account_number == number))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<account::Model>, ServiceError> {
        let s = self.state.lock().await;
        let mut out: Vec<_> = s.accounts.values().filter(|a| !a.is_deleted && a.user_id == user_id).cloned().collect();
        out.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
        Ok(out)
    }

    async fn list_for_branch(&self, branch_id: Uuid, page: Pagination) -> Result<(Vec<account::Model>, u64), ServiceError> {
        let s = self.state.lock().await;
        let mut all: Vec<_> = s.accounts.values().filter(|a| !a.is_deleted && a.branch_id == branch_id).cloned().collect();
        all.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        let total = all.len() as u64;
        Ok((page.slice(&all), total))
    }

    async fn set_status(&self, id: Uuid, change: StatusChange) -> Result<account::Model, ServiceError> {
        let mut s = self.state.lock().await;
        let acc = s.accounts.get_mut(&id).filter(|a| !a.is_deleted).ok_or_else(|| ServiceError::not_found("account"))?;
        change.check(acc)?;
        change.apply(acc, Utc::now());
        Ok(acc.clone())
    }

    async fn summary(&self, branch_id: Option<Uuid>) -> Result<AccountSummary, ServiceError> {
        let s = self.state.lock().await;
        Ok(AccountSummary::from_accounts(
            s.accounts.values().filter(|a| !a.is_deleted && (branch_id.is_none() || Some(a.branch_id) == branch_id)),
        ))
    }
}

#[async_trait]
impl TransactionRepository for InMemoryBank {
    async fn post(&self, posting: Posting) -> Result<transaction::Model, ServiceError> {
        let mut s = self.state.lock().await;
        let load = |id: Option<Uuid>| -> Result<Option<account::Model>, ServiceError> {
            id.map(|id| s.live_account(id).cloned().ok_or_else(|| ServiceError::not_found("account"))).transpose()
        };
        let mut from = load(posting.from)?;
        let mut to = load(posting.to)?;
        let row = posting.apply(from.as_mut(), to.as_mut(), Utc::now())?;
        for acc in from.into_iter().chain(to) {
            s.accounts.insert(acc.id, acc);
        }
        s.transactions.push(row.clone());
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<transaction::Model>, ServiceError> {
        Ok(self.state.lock().await.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_for_account(&self, account_id: Uuid, page: Pagination) -> Result<(Vec<transaction::Model>, u64), ServiceError> {
        let s = self.state.lock().await;
        let all = newest_first(s.transactions.iter().filter(|t| t.touches(account_id)).cloned());
        let total = all.len() as u64;
        Ok((page.slice(&all), total))
    }

    async fn recent(&self, account_ids: &[Uuid], limit: u64) -> Result<Vec<transaction::Model>, ServiceError> {
        let s = self.state.lock().await;
        let mut all = newest_first(s.transactions.iter().filter(|t| account_ids.iter().any(|id| t.touches(*id))).cloned());
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn stats(&self, since: Option<DateTime<Utc>>) -> Result<TransactionStats, ServiceError> {
        let s = self.state.lock().await;
        let mut stats = TransactionStats::default();
        s.transactions
            .iter()
            .filter(|t| since.map_or(true, |since| t.transaction_date.with_timezone(&Utc) >= since))
            .for_each(|t| stats.add(t));
        Ok(stats)
    }
}
