//! Role dashboards: headline numbers for admins, branch managers and
//! customers.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use models::enums::{AccountStatus, UserRole};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::domain::{AccountSummary, AccountView};
use crate::account::repository::AccountRepository;
use crate::branch::domain::BranchView;
use crate::branch::repository::BranchRepository;
use crate::context::Actor;
use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::transaction::domain::{TransactionStats, TransactionView};
use crate::transaction::repository::TransactionRepository;
use crate::transaction::service::RECENT_LIMIT;
use crate::user::repository::UserRepository;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminDashboard {
    pub users_by_role: BTreeMap<String, u64>,
    pub branches: u64,
    pub accounts: AccountSummary,
    pub transactions: TransactionStats,
    pub transactions_today: TransactionStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerDashboard {
    pub branch: BranchView,
    pub customers: u64,
    pub accounts: AccountSummary,
    pub recent_transactions: Vec<TransactionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerDashboard {
    pub accounts: Vec<AccountView>,
    pub total_balance: Decimal,
    pub recent_transactions: Vec<TransactionView>,
}

pub struct DashboardService {
    users: Arc<dyn UserRepository>,
    branches: Arc<dyn BranchRepository>,
    accounts: Arc<dyn AccountRepository>,
    txns: Arc<dyn TransactionRepository>,
}

impl DashboardService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        branches: Arc<dyn BranchRepository>,
        accounts: Arc<dyn AccountRepository>,
        txns: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self { users, branches, accounts, txns }
    }

    async fn recent(&self, account_ids: &[Uuid]) -> Result<Vec<TransactionView>, ServiceError> {
        self.txns.recent(account_ids, RECENT_LIMIT).await?.into_iter().map(TransactionView::try_from).collect()
    }

    pub async fn admin(&self, actor: &Actor) -> Result<AdminDashboard, ServiceError> {
        actor.require_role(&[UserRole::Admin])?;
        let mut users_by_role = BTreeMap::new();
        for role in UserRole::ALL {
            users_by_role.insert(role.as_str().to_string(), self.users.count_by_role(*role, None).await?);
        }
        let midnight = Utc::now().date_naive().and_hms_opt(0, 0, 0).map(|t| t.and_utc());
        Ok(AdminDashboard {
            users_by_role,
            branches: self.branches.list(true).await?.len() as u64,
            accounts: self.accounts.summary(None).await?,
            transactions: self.txns.stats(None).await?,
            transactions_today: self.txns.stats(midnight).await?,
        })
    }

    pub async fn manager(&self, actor: &Actor) -> Result<ManagerDashboard, ServiceError> {
        actor.require_role(&[UserRole::BranchManager])?;
        let branch_id = actor.branch_id.ok_or_else(|| ServiceError::forbidden("manager has no branch"))?;
        let branch = self.branches.find(branch_id).await?.ok_or_else(|| ServiceError::not_found("branch"))?;
        let (accounts, _) = self.accounts.list_for_branch(branch_id, Pagination { page: 1, per_page: 100 }).await?;
        let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();
        Ok(ManagerDashboard {
            branch: branch.try_into()?,
            customers: self.users.count_by_role(UserRole::Customer, Some(branch_id)).await?,
            accounts: self.accounts.summary(Some(branch_id)).await?,
            recent_transactions: self.recent(&ids).await?,
        })
    }

    pub async fn customer(&self, actor: &Actor) -> Result<CustomerDashboard, ServiceError> {
        let accounts = self.accounts.list_for_user(actor.user_id).await?;
        let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();
        let total_balance = accounts
            .iter()
            .filter(|a| a.status != AccountStatus::Closed.as_str())
            .map(|a| a.balance)
            .sum();
        Ok(CustomerDashboard {
            accounts: accounts.into_iter().map(AccountView::try_from).collect::<Result<_, _>>()?,
            total_balance,
            recent_transactions: self.recent(&ids).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBank;
    use crate::transaction::domain::DepositInput;
    use crate::transaction::TransactionService;
    use models::enums::AccountType;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn dashboards_reflect_activity() {
        let bank = Arc::new(InMemoryBank::new());
        let branch = bank.seed_branch("MUM001", "SIMB0000001").await.id;
        let admin = bank.seed_user("root@bank.in", "Root", UserRole::Admin, None, "Adm1nPass").await;
        let manager = bank.seed_user("m@bank.in", "M", UserRole::BranchManager, Some(branch), "Manag3rPass").await;
        let customer = bank.seed_user("c@bank.in", "C", UserRole::Customer, Some(branch), "Passw0rd!").await;
        let acc = bank.seed_account(customer.id, branch, AccountType::Savings, dec!(5000)).await;
        bank.seed_account(customer.id, branch, AccountType::Current, dec!(7000)).await;

        let cust = Actor::new(customer.id, UserRole::Customer, Some(branch));
        let txns = TransactionService::new(bank.clone(), bank.clone());
        txns.deposit(&cust, DepositInput { account_id: acc.id, amount: dec!(1000), description: None }).await.unwrap();

        let dash = DashboardService::new(bank.clone(), bank.clone(), bank.clone(), bank.clone());

        let a = dash.admin(&Actor::new(admin.id, UserRole::Admin, None)).await.unwrap();
        assert_eq!(a.users_by_role["Customer"], 1);
        assert_eq!(a.users_by_role["BranchManager"], 1);
        assert_eq!(a.branches, 1);
        assert_eq!(a.accounts.total, 2);
        assert_eq!(a.accounts.total_balance, dec!(13000));
        assert_eq!(a.transactions.count, 1);
        assert_eq!(a.transactions_today.volume, dec!(1000));

        let m = dash.manager(&Actor::new(manager.id, UserRole::BranchManager, Some(branch))).await.unwrap();
        assert_eq!(m.customers, 1);
        assert_eq!(m.recent_transactions.len(), 1);

        let c = dash.customer(&cust).await.unwrap();
        assert_eq!(c.accounts.len(), 2);
        assert_eq!(c.total_balance, dec!(13000));

        assert!(dash.admin(&cust).await.is_err());
        assert!(dash.manager(&cust).await.is_err());
    }
}
