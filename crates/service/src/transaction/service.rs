use std::sync::Arc;

use models::account;
use models::enums::{TransactionType, UserRole};
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{DepositInput, Posting, TransactionView, TransferInput, WithdrawInput};
use super::repository::TransactionRepository;
use crate::account::repository::AccountRepository;
use crate::context::Actor;
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::rules::{check_credit, check_debit, RuleViolation};
use crate::validation::Validate;

pub const RECENT_LIMIT: u64 = 10;

pub struct TransactionService {
    accounts: Arc<dyn AccountRepository>,
    txns: Arc<dyn TransactionRepository>,
}

impl TransactionService {
    pub fn new(accounts: Arc<dyn AccountRepository>, txns: Arc<dyn TransactionRepository>) -> Self {
        Self { accounts, txns }
    }

    async fn account(&self, id: Uuid) -> Result<account::Model, ServiceError> {
        self.accounts.find(id).await?.ok_or_else(|| ServiceError::not_found("account"))
    }

    /// Customers move money only on their own accounts; managers within
    /// their branch; admins anywhere.
    fn authorize(actor: &Actor, acc: &account::Model) -> Result<(), ServiceError> {
        let allowed = match actor.role {
            UserRole::Customer => acc.user_id == actor.user_id,
            _ => actor.manages_branch(acc.branch_id),
        };
        if allowed { Ok(()) } else { Err(ServiceError::forbidden("not allowed to operate this account")) }
    }

    async fn post(&self, posting: Posting) -> Result<TransactionView, ServiceError> {
        let row = self.txns.post(posting).await?;
        info!(
            event = "transaction_posted",
            reference = %row.reference,
            kind = %row.transaction_type,
            amount = %row.amount,
            "transaction_posted"
        );
        row.try_into()
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id, account_id = %input.account_id))]
    pub async fn deposit(&self, actor: &Actor, input: DepositInput) -> Result<TransactionView, ServiceError> {
        input.validate()?;
        let acc = self.account(input.account_id).await?;
        Self::authorize(actor, &acc)?;
        check_credit(&acc, input.amount)?;
        self.post(Posting {
            kind: TransactionType::Deposit,
            from: None,
            to: Some(acc.id),
            amount: input.amount,
            description: input.description.unwrap_or_else(|| "Cash deposit".into()),
            created_by: actor.user_id,
        })
        .await
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id, account_id = %input.account_id))]
    pub async fn withdraw(&self, actor: &Actor, input: WithdrawInput) -> Result<TransactionView, ServiceError> {
        input.validate()?;
        let acc = self.account(input.account_id).await?;
        Self::authorize(actor, &acc)?;
        check_debit(&acc, input.amount)?;
        self.post(Posting {
            kind: TransactionType::Withdrawal,
            from: Some(acc.id),
            to: None,
            amount: input.amount,
            description: input.description.unwrap_or_else(|| "Cash withdrawal".into()),
            created_by: actor.user_id,
        })
        .await
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id, from = %input.from_account_id))]
    pub async fn transfer(&self, actor: &Actor, input: TransferInput) -> Result<TransactionView, ServiceError> {
        input.validate()?;
        let src = self.account(input.from_account_id).await?;
        Self::authorize(actor, &src)?;
        let dst = match (input.to_account_id, input.to_account_number.as_deref()) {
            (Some(id), _) => self.account(id).await?,
            (None, Some(number)) => self
                .accounts
                .find_by_number(number)
                .await?
                .ok_or_else(|| ServiceError::not_found("destination account"))?,
            (None, None) => return Err(ServiceError::not_found("destination account")),
        };
        if src.id == dst.id {
            return Err(RuleViolation::SameAccount.into());
        }
        check_debit(&src, input.amount)?;
        check_credit(&dst, input.amount)?;
        let description = input
            .description
            .unwrap_or_else(|| format!("Transfer to {}", dst.account_number));
        self.post(Posting {
            kind: TransactionType::Transfer,
            from: Some(src.id),
            to: Some(dst.id),
            amount: input.amount,
            description,
            created_by: actor.user_id,
        })
        .await
    }

    async fn can_view_account(&self, actor: &Actor, id: Option<Uuid>) -> Result<bool, ServiceError> {
        match id {
            Some(id) => Ok(self.accounts.find(id).await?.is_some_and(|a| actor.can_view(a.user_id, a.branch_id))),
            None => Ok(false),
        }
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<TransactionView, ServiceError> {
        let t = self.txns.find(id).await?.ok_or_else(|| ServiceError::not_found("transaction"))?;
        if !actor.is_admin()
            && !self.can_view_account(actor, t.from_account_id).await?
            && !self.can_view_account(actor, t.to_account_id).await?
        {
            return Err(ServiceError::forbidden("not allowed to view this transaction"));
        }
        t.try_into()
    }

    /// Newest first.
    pub async fn history(&self, actor: &Actor, account_id: Uuid, page: Pagination) -> Result<Page<TransactionView>, ServiceError> {
        let acc = self.account(account_id).await?;
        if !actor.can_view(acc.user_id, acc.branch_id) {
            return Err(ServiceError::forbidden("not allowed to view this account"));
        }
        let (items, total) = self.txns.list_for_account(account_id, page).await?;
        Page::new(items, total, page).try_map(TransactionView::try_from)
    }

    /// Latest activity across the caller's own accounts.
    pub async fn recent_for_user(&self, actor: &Actor, limit: Option<u64>) -> Result<Vec<TransactionView>, ServiceError> {
        let ids: Vec<Uuid> = self.accounts.list_for_user(actor.user_id).await?.into_iter().map(|a| a.id).collect();
        let limit = limit.unwrap_or(RECENT_LIMIT).clamp(1, 100);
        self.txns.recent(&ids, limit).await?.into_iter().map(TransactionView::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBank;
    use models::enums::{AccountStatus, AccountType};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Fixture {
        bank: Arc<InMemoryBank>,
        svc: TransactionService,
        customer: Actor,
        savings: account::Model,
        current: account::Model,
    }

    async fn fixture() -> Fixture {
        let bank = Arc::new(InMemoryBank::new());
        let branch = bank.seed_branch("MUM001", "SIMB0000001").await.id;
        let user = bank.seed_user("asha@bank.in", "Asha", UserRole::Customer, Some(branch), "Passw0rd!").await;
        let savings = bank.seed_account(user.id, branch, AccountType::Savings, dec!(10000)).await;
        let current = bank.seed_account(user.id, branch, AccountType::Current, dec!(5000)).await;
        Fixture {
            svc: TransactionService::new(bank.clone(), bank.clone()),
            customer: Actor::new(user.id, UserRole::Customer, Some(branch)),
            bank,
            savings,
            current,
        }
    }

    async fn balance(bank: &InMemoryBank, id: Uuid) -> Decimal {
        bank.account(id).await.map(|a| a.balance).unwrap_or_default()
    }

    fn rule(err: ServiceError) -> RuleViolation {
        match err {
            ServiceError::Rule(r) => r,
            other => panic!("expected rule violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deposit_and_withdraw() {
        let f = fixture().await;
        let d = f.svc.deposit(&f.customer, DepositInput { account_id: f.savings.id, amount: dec!(2500), description: None }).await.unwrap();
        assert_eq!(d.to_balance_after, Some(dec!(12500)));
        assert_eq!(d.transaction_type, TransactionType::Deposit);

        let w = f.svc.withdraw(&f.customer, WithdrawInput { account_id: f.savings.id, amount: dec!(500), description: None }).await.unwrap();
        assert_eq!(w.from_balance_after, Some(dec!(12000)));
        assert_eq!(balance(&f.bank, f.savings.id).await, dec!(12000));
    }

    #[tokio::test]
    async fn transfer_by_number() {
        let f = fixture().await;
        let t = f
            .svc
            .transfer(&f.customer, TransferInput {
                from_account_id: f.savings.id,
                to_account_id: None,
                to_account_number: Some(f.current.account_number.clone()),
                amount: dec!(4000),
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(t.description, format!("Transfer to {}", f.current.account_number));
        assert_eq!(balance(&f.bank, f.savings.id).await, dec!(6000));
        assert_eq!(balance(&f.bank, f.current.id).await, dec!(9000));
    }

    #[tokio::test]
    async fn minimum_balance_is_kept() {
        let f = fixture().await;
        let err = f.svc.withdraw(&f.customer, WithdrawInput { account_id: f.savings.id, amount: dec!(9500), description: None }).await.unwrap_err();
        assert_eq!(rule(err), RuleViolation::InsufficientFunds { available: dec!(9000) });
        assert_eq!(balance(&f.bank, f.savings.id).await, dec!(10000));
    }

    #[tokio::test]
    async fn frozen_accounts_reject_credits() {
        let f = fixture().await;
        f.bank.set_account_status(f.current.id, AccountStatus::Frozen).await;
        let err = f.svc.deposit(&f.customer, DepositInput { account_id: f.current.id, amount: dec!(10), description: None }).await.unwrap_err();
        assert!(matches!(rule(err), RuleViolation::AccountNotActive { .. }));
    }

    #[tokio::test]
    async fn customers_cannot_debit_others() {
        let f = fixture().await;
        let intruder = Actor::new(Uuid::new_v4(), UserRole::Customer, None);
        let err = f.svc.withdraw(&intruder, WithdrawInput { account_id: f.savings.id, amount: dec!(10), description: None }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_scoped() {
        let f = fixture().await;
        for amount in [dec!(100), dec!(200), dec!(300)] {
            f.svc.deposit(&f.customer, DepositInput { account_id: f.savings.id, amount, description: None }).await.unwrap();
        }
        let page = f.svc.history(&f.customer, f.savings.id, Pagination { page: 1, per_page: 2 }).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].amount, dec!(300));

        let stranger = Actor::new(Uuid::new_v4(), UserRole::Customer, None);
        assert!(f.svc.history(&stranger, f.savings.id, Pagination::default()).await.is_err());
        assert!(f.svc.get(&stranger, page.items[0].id).await.is_err());
        assert_eq!(f.svc.get(&f.customer, page.items[0].id).await.unwrap().amount, dec!(300));

        let recent = f.svc.recent_for_user(&f.customer, Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_withdrawals_never_overdraw() {
        let f = fixture().await;
        let svc = Arc::new(f.svc);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let svc = svc.clone();
            let actor = f.customer.clone();
            let id = f.savings.id;
            handles.push(tokio::spawn(async move {
                svc.withdraw(&actor, WithdrawInput { account_id: id, amount: dec!(1000), description: None }).await.is_ok()
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap() {
                ok += 1;
            }
        }
        assert_eq!(ok, 9);
        assert_eq!(balance(&f.bank, f.savings.id).await, dec!(1000));
    }
}
