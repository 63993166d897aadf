use std::sync::Arc;

use chrono::Utc;
use models::enums::{AccountStatus, TransactionStatus, TransactionType, UserRole, UserStatus};
use models::{account, transaction};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::{generate_account_number, AccountView, OpenAccountInput, StatusChange, UpdateAccountStatusInput};
use super::repository::AccountRepository;
use crate::branch::repository::BranchRepository;
use crate::context::Actor;
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::rules::check_opening;
use crate::transaction::domain::new_reference;
use crate::user::repository::UserRepository;
use crate::validation::{Validate, ValidationErrors};

const NUMBER_ATTEMPTS: usize = 10;

pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    users: Arc<dyn UserRepository>,
    branches: Arc<dyn BranchRepository>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>, users: Arc<dyn UserRepository>, branches: Arc<dyn BranchRepository>) -> Self {
        Self { accounts, users, branches }
    }

    async fn load(&self, id: Uuid) -> Result<account::Model, ServiceError> {
        self.accounts.find(id).await?.ok_or_else(|| ServiceError::not_found("account"))
    }

    fn ensure_visible(actor: &Actor, acc: &account::Model) -> Result<(), ServiceError> {
        if actor.can_view(acc.user_id, acc.branch_id) {
            Ok(())
        } else {
            Err(ServiceError::forbidden("not allowed to view this account"))
        }
    }

    async fn unused_number(&self) -> Result<String, ServiceError> {
        for _ in 0..NUMBER_ATTEMPTS {
            let n = generate_account_number();
            if !self.accounts.number_exists(&n).await? {
                return Ok(n);
            }
            warn!("account number collision, retrying");
        }
        Err(ServiceError::Internal("could not allocate an account number".into()))
    }

    /// Open an account with its opening deposit.
    ///
    /// Customers open for themselves, managers for customers of their branch
    /// and admins for any customer.
    #[instrument(skip(self, input), fields(actor = %actor.user_id, account_type = %input.account_type))]
    pub async fn open(&self, actor: &Actor, input: OpenAccountInput) -> Result<AccountView, ServiceError> {
        input.validate()?;
        let owner_id = match actor.role {
            UserRole::Customer => {
                if input.user_id.is_some_and(|u| u != actor.user_id) {
                    return Err(ServiceError::forbidden("customers may only open their own accounts"));
                }
                actor.user_id
            }
            _ => input.user_id.ok_or_else(|| ServiceError::Validation(ValidationErrors::single("user_id", "user_id is required")))?,
        };
        let owner = self.users.find(owner_id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        if owner.role()? != UserRole::Customer {
            return Err(ServiceError::Conflict("accounts can only be opened for customers".into()));
        }
        if owner.status()? != UserStatus::Active {
            return Err(ServiceError::Conflict("customer is not active".into()));
        }
        let branch_id = input
            .branch_id
            .or(owner.branch_id)
            .ok_or_else(|| ServiceError::Validation(ValidationErrors::single("branch_id", "branch_id is required")))?;
        if actor.role == UserRole::BranchManager && !actor.manages_branch(branch_id) {
            return Err(ServiceError::forbidden("branch belongs to another manager"));
        }
        let branch = self.branches.find(branch_id).await?.ok_or_else(|| ServiceError::not_found("branch"))?;
        if !branch.is_active {
            return Err(ServiceError::Conflict("branch is not active".into()));
        }
        check_opening(input.account_type, input.initial_deposit)?;

        let now = Utc::now();
        let account = account::Model {
            id: Uuid::new_v4(),
            account_number: self.unused_number().await?,
            user_id: owner.id,
            branch_id,
            account_type: input.account_type.as_str().to_string(),
            balance: input.initial_deposit,
            status: AccountStatus::Active.as_str().to_string(),
            is_deleted: false,
            created_by: Some(actor.user_id),
            opened_at: now.into(),
            updated_at: now.into(),
        };
        let opening = (input.initial_deposit > Decimal::ZERO).then(|| transaction::Model {
            id: Uuid::new_v4(),
            reference: new_reference(),
            from_account_id: None,
            to_account_id: Some(account.id),
            amount: input.initial_deposit,
            transaction_type: TransactionType::Deposit.as_str().to_string(),
            status: TransactionStatus::Completed.as_str().to_string(),
            description: "Opening deposit".into(),
            from_balance_after: None,
            to_balance_after: Some(input.initial_deposit),
            created_by: Some(actor.user_id),
            transaction_date: now.into(),
        });
        let created = self.accounts.open(account, opening).await?;
        info!(event = "account_opened", account_id = %created.id, number = %created.account_number, "account_opened");
        created.try_into()
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<AccountView, ServiceError> {
        let acc = self.load(id).await?;
        Self::ensure_visible(actor, &acc)?;
        acc.try_into()
    }

    pub async fn get_by_number(&self, actor: &Actor, number: &str) -> Result<AccountView, ServiceError> {
        let acc = self.accounts.find_by_number(number).await?.ok_or_else(|| ServiceError::not_found("account"))?;
        Self::ensure_visible(actor, &acc)?;
        acc.try_into()
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<AccountView>, ServiceError> {
        self.list_for_user(actor, actor.user_id).await
    }

    pub async fn list_for_user(&self, actor: &Actor, user_id: Uuid) -> Result<Vec<AccountView>, ServiceError> {
        self.accounts
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|a| actor.can_view(a.user_id, a.branch_id))
            .map(AccountView::try_from)
            .collect()
    }

    pub async fn list_for_branch(&self, actor: &Actor, branch_id: Uuid, page: Pagination) -> Result<Page<AccountView>, ServiceError> {
        actor.require_role(&[UserRole::Admin, UserRole::BranchManager])?;
        if !actor.manages_branch(branch_id) {
            return Err(ServiceError::forbidden("branch belongs to another manager"));
        }
        let (items, total) = self.accounts.list_for_branch(branch_id, page).await?;
        Page::new(items, total, page).try_map(AccountView::try_from)
    }

    /// `Closed` is terminal and needs a zero balance.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn update_status(&self, actor: &Actor, id: Uuid, input: UpdateAccountStatusInput) -> Result<AccountView, ServiceError> {
        actor.require_role(&[UserRole::Admin, UserRole::BranchManager])?;
        let acc = self.load(id).await?;
        if !actor.manages_branch(acc.branch_id) {
            return Err(ServiceError::forbidden("branch belongs to another manager"));
        }
        let current = acc.state()?;
        let change = StatusChange::to(input.status);
        change.check(&acc)?;
        let updated = self.accounts.set_status(id, change).await?;
        info!(event = "account_status_changed", account_id = %id, from = %current, to = %input.status, "account_status_changed");
        updated.try_into()
    }

    /// Soft delete; only empty accounts.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        actor.require_role(&[UserRole::Admin, UserRole::BranchManager])?;
        let acc = self.load(id).await?;
        if !actor.manages_branch(acc.branch_id) {
            return Err(ServiceError::forbidden("branch belongs to another manager"));
        }
        let change = StatusChange::delete();
        change.check(&acc)?;
        self.accounts.set_status(id, change).await?;
        info!(event = "account_deleted", account_id = %id, "account_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::domain::AccountSummary;
    use crate::memory::InMemoryBank;
    use crate::rules::RuleViolation;
    use crate::transaction::domain::Posting;
    use crate::transaction::repository::TransactionRepository;
    use models::enums::AccountType;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Posts a pending deposit right after the account is read, so it
    /// commits between the service's read and its write.
    struct DepositAfterRead {
        bank: Arc<InMemoryBank>,
        pending: Mutex<Option<Posting>>,
    }

    #[async_trait::async_trait]
    impl AccountRepository for DepositAfterRead {
        async fn open(&self, a: account::Model, opening: Option<transaction::Model>) -> Result<account::Model, ServiceError> {
            AccountRepository::open(&*self.bank, a, opening).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<account::Model>, ServiceError> {
            let found = AccountRepository::find(&*self.bank, id).await?;
            let pending = self.pending.lock().unwrap().take();
            if let Some(p) = pending {
                self.bank.post(p).await?;
            }
            Ok(found)
        }

        async fn find_by_number(&self, number: &str) -> Result<Option<account::Model>, ServiceError> {
            self.bank.find_by_number(number).await
        }

        async fn number_exists(&self, number: &str) -> Result<bool, ServiceError> {
            self.bank.number_exists(number).await
        }

        async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<account::Model>, ServiceError> {
            AccountRepository::list_for_user(&*self.bank, user_id).await
        }

        async fn list_for_branch(&self, branch_id: Uuid, page: Pagination) -> Result<(Vec<account::Model>, u64), ServiceError> {
            AccountRepository::list_for_branch(&*self.bank, branch_id, page).await
        }

        async fn set_status(&self, id: Uuid, change: StatusChange) -> Result<account::Model, ServiceError> {
            self.bank.set_status(id, change).await
        }

        async fn summary(&self, branch_id: Option<Uuid>) -> Result<AccountSummary, ServiceError> {
            self.bank.summary(branch_id).await
        }
    }

    fn deposit(to: Uuid, amount: Decimal) -> Posting {
        Posting { kind: TransactionType::Deposit, from: None, to: Some(to), amount, description: "Cash deposit".into(), created_by: Uuid::new_v4() }
    }

    struct Fixture {
        bank: Arc<InMemoryBank>,
        svc: AccountService,
        branch: Uuid,
        customer: Actor,
    }

    async fn fixture() -> Fixture {
        let bank = Arc::new(InMemoryBank::new());
        let branch = bank.seed_branch("MUM001", "SIMB0000001").await.id;
        let user = bank.seed_user("asha@bank.in", "Asha", UserRole::Customer, Some(branch), "Passw0rd!").await;
        Fixture {
            svc: AccountService::new(bank.clone(), bank.clone(), bank.clone()),
            customer: Actor::new(user.id, UserRole::Customer, Some(branch)),
            bank,
            branch,
        }
    }

    fn open(kind: AccountType, deposit: Decimal) -> OpenAccountInput {
        OpenAccountInput { user_id: None, branch_id: None, account_type: kind, initial_deposit: deposit }
    }

    #[tokio::test]
    async fn customer_opens_own_account_with_opening_deposit() {
        let f = fixture().await;
        let acc = f.svc.open(&f.customer, open(AccountType::Savings, dec!(1500))).await.unwrap();
        assert_eq!(acc.balance, dec!(1500));
        assert_eq!(acc.branch_id, f.branch);
        assert_eq!(acc.account_number.len(), 12);
        let ledger = f.bank.transactions_for(acc.id).await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].description, "Opening deposit");
        assert_eq!(f.svc.list_mine(&f.customer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_deposit_salary_has_no_ledger_row() {
        let f = fixture().await;
        let acc = f.svc.open(&f.customer, open(AccountType::Salary, dec!(0))).await.unwrap();
        assert!(f.bank.transactions_for(acc.id).await.is_empty());
    }

    #[tokio::test]
    async fn opening_minimum_enforced() {
        let f = fixture().await;
        let err = f.svc.open(&f.customer, open(AccountType::FixedDeposit, dec!(5000))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rule(RuleViolation::BelowMinimumOpening { .. })));
    }

    #[tokio::test]
    async fn manager_scope() {
        let f = fixture().await;
        let other = f.bank.seed_branch("PUN001", "SIMB0000002").await.id;
        let manager = Actor::new(Uuid::new_v4(), UserRole::BranchManager, Some(other));
        let mut input = open(AccountType::Savings, dec!(2000));
        input.user_id = Some(f.customer.user_id);
        assert!(matches!(f.svc.open(&manager, input.clone()).await, Err(ServiceError::Forbidden(_))));

        let own = Actor::new(Uuid::new_v4(), UserRole::BranchManager, Some(f.branch));
        let acc = f.svc.open(&own, input).await.unwrap();
        assert_eq!(f.svc.list_for_branch(&own, f.branch, Pagination::default()).await.unwrap().total, 1);
        assert!(f.svc.list_for_branch(&manager, f.branch, Pagination::default()).await.is_err());
        assert!(f.svc.get(&manager, acc.id).await.is_err());
        assert_eq!(f.svc.get_by_number(&own, &acc.account_number).await.unwrap().id, acc.id);
    }

    #[tokio::test]
    async fn closing_requires_zero_balance_and_is_terminal() {
        let f = fixture().await;
        let admin = Actor::new(Uuid::new_v4(), UserRole::Admin, None);
        let acc = f.svc.open(&f.customer, open(AccountType::Salary, dec!(100))).await.unwrap();
        let close = UpdateAccountStatusInput { status: AccountStatus::Closed };
        assert!(matches!(f.svc.update_status(&admin, acc.id, close).await, Err(ServiceError::Rule(RuleViolation::NonZeroBalance { .. }))));

        let empty = f.svc.open(&f.customer, open(AccountType::Salary, dec!(0))).await.unwrap();
        let frozen = f.svc.update_status(&admin, empty.id, UpdateAccountStatusInput { status: AccountStatus::Frozen }).await.unwrap();
        assert_eq!(frozen.status, AccountStatus::Frozen);
        f.svc.update_status(&admin, empty.id, close).await.unwrap();
        let reopen = f.svc.update_status(&admin, empty.id, UpdateAccountStatusInput { status: AccountStatus::Active }).await;
        assert!(matches!(reopen, Err(ServiceError::Conflict(_))));
        assert!(f.svc.update_status(&f.customer, empty.id, close).await.is_err());
    }

    #[tokio::test]
    async fn delete_only_empty_accounts() {
        let f = fixture().await;
        let admin = Actor::new(Uuid::new_v4(), UserRole::Admin, None);
        let full = f.svc.open(&f.customer, open(AccountType::Savings, dec!(1000))).await.unwrap();
        assert!(f.svc.delete(&admin, full.id).await.is_err());
        let empty = f.svc.open(&f.customer, open(AccountType::Salary, dec!(0))).await.unwrap();
        f.svc.delete(&admin, empty.id).await.unwrap();
        assert!(matches!(f.svc.get(&admin, empty.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn status_change_keeps_a_deposit_made_after_the_read() {
        let f = fixture().await;
        let admin = Actor::new(Uuid::new_v4(), UserRole::Admin, None);
        let acc = f.bank.seed_account(f.customer.user_id, f.branch, AccountType::Savings, dec!(10000)).await;
        let racing = Arc::new(DepositAfterRead { bank: f.bank.clone(), pending: Mutex::new(Some(deposit(acc.id, dec!(5000)))) });
        let svc = AccountService::new(racing, f.bank.clone(), f.bank.clone());

        let view = svc.update_status(&admin, acc.id, UpdateAccountStatusInput { status: AccountStatus::Frozen }).await.unwrap();
        assert_eq!(view.status, AccountStatus::Frozen);
        assert_eq!(view.balance, dec!(15000));

        let stored = f.bank.account(acc.id).await.unwrap();
        assert_eq!(stored.balance, dec!(15000));
        let ledger = f.bank.transactions_for(acc.id).await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].to_balance_after, Some(stored.balance));
    }

    #[tokio::test]
    async fn close_rechecks_balance_under_lock() {
        let f = fixture().await;
        let admin = Actor::new(Uuid::new_v4(), UserRole::Admin, None);
        let acc = f.bank.seed_account(f.customer.user_id, f.branch, AccountType::Salary, dec!(0)).await;
        let racing = Arc::new(DepositAfterRead { bank: f.bank.clone(), pending: Mutex::new(Some(deposit(acc.id, dec!(100)))) });
        let svc = AccountService::new(racing, f.bank.clone(), f.bank.clone());

        let close = svc.update_status(&admin, acc.id, UpdateAccountStatusInput { status: AccountStatus::Closed }).await;
        assert!(matches!(close, Err(ServiceError::Rule(RuleViolation::NonZeroBalance { .. }))));
        let stored = f.bank.account(acc.id).await.unwrap();
        assert_eq!(stored.balance, dec!(100));
        assert_eq!(stored.status, AccountStatus::Active.as_str());
    }
}
