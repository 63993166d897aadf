//! Service layer providing the bank's business operations on top of models.
//! - Separates business logic from data access: every service talks to
//!   repository traits, implemented over SeaORM and in memory.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub mod errors;
pub mod validation;
pub mod context;
pub mod pagination;
pub mod rules;
pub mod auth;
pub mod otp;
pub mod branch;
pub mod user;
pub mod account;
pub mod transaction;
pub mod dashboard;
pub mod memory;
#[cfg(test)]
pub mod test_support;
#[cfg(test)]
mod tests;

pub use context::Actor;
pub use errors::ServiceError;

use account::repository::AccountRepository;
use auth::repository::AuthRepository;
use auth::service::AuthConfig;
use branch::repository::BranchRepository;
use otp::repository::OtpRepository;
use otp::{OtpSender, OtpSettings};
use transaction::repository::TransactionRepository;
use user::repository::UserRepository;

/// The storage seams, one per aggregate.
#[derive(Clone)]
pub struct Repositories {
    pub auth: Arc<dyn AuthRepository>,
    pub otp: Arc<dyn OtpRepository>,
    pub branches: Arc<dyn BranchRepository>,
    pub users: Arc<dyn UserRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
}

impl Repositories {
    pub fn seaorm(db: DatabaseConnection) -> Self {
        Self {
            auth: Arc::new(auth::seaorm::SeaOrmAuthRepository { db: db.clone() }),
            otp: Arc::new(otp::seaorm::SeaOrmOtpRepository { db: db.clone() }),
            branches: Arc::new(branch::seaorm::SeaOrmBranchRepository { db: db.clone() }),
            users: Arc::new(user::seaorm::SeaOrmUserRepository { db: db.clone() }),
            accounts: Arc::new(account::seaorm::SeaOrmAccountRepository { db: db.clone() }),
            transactions: Arc::new(transaction::seaorm::SeaOrmTransactionRepository { db }),
        }
    }

    pub fn in_memory(bank: Arc<memory::InMemoryBank>) -> Self {
        Self {
            auth: bank.clone(),
            otp: bank.clone(),
            branches: bank.clone(),
            users: bank.clone(),
            accounts: bank.clone(),
            transactions: bank,
        }
    }
}

#[derive(Clone)]
pub struct ServiceSettings {
    pub auth: AuthConfig,
    pub otp: OtpSettings,
}

/// Every service, wired to one set of repositories.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<auth::AuthService>,
    pub otp: Arc<otp::OtpService>,
    pub registration: Arc<user::RegistrationService>,
    pub users: Arc<user::UserService>,
    pub branches: Arc<branch::BranchService>,
    pub accounts: Arc<account::AccountService>,
    pub transactions: Arc<transaction::TransactionService>,
    pub dashboard: Arc<dashboard::DashboardService>,
}

impl AppServices {
    pub fn build(repos: Repositories, sender: Arc<dyn OtpSender>, settings: ServiceSettings) -> Self {
        let otp = Arc::new(otp::OtpService::new(repos.otp.clone(), sender, settings.otp));
        Self {
            auth: Arc::new(auth::AuthService::new(repos.auth.clone(), Some(otp.clone()), settings.auth)),
            registration: Arc::new(user::RegistrationService::new(repos.users.clone(), repos.branches.clone(), otp.clone())),
            users: Arc::new(user::UserService::new(repos.users.clone(), repos.branches.clone())),
            branches: Arc::new(branch::BranchService::new(repos.branches.clone())),
            accounts: Arc::new(account::AccountService::new(repos.accounts.clone(), repos.users.clone(), repos.branches.clone())),
            transactions: Arc::new(transaction::TransactionService::new(repos.accounts.clone(), repos.transactions.clone())),
            dashboard: Arc::new(dashboard::DashboardService::new(repos.users, repos.branches, repos.accounts, repos.transactions)),
            otp,
        }
    }
}
