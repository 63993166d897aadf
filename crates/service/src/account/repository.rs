use async_trait::async_trait;
use models::{account, transaction};
use uuid::Uuid;

use super::domain::{AccountSummary, StatusChange};
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Reads never return soft-deleted accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert the account and, when given, its opening deposit in one unit.
    async fn open(&self, account: account::Model, opening: Option<transaction::Model>) -> Result<account::Model, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<account::Model>, ServiceError>;
    async fn find_by_number(&self, number: &str) -> Result<Option<account::Model>, ServiceError>;
    /// Includes deleted accounts; numbers are never reused.
    async fn number_exists(&self, number: &str) -> Result<bool, ServiceError>;
    /// Oldest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<account::Model>, ServiceError>;
    async fn list_for_branch(&self, branch_id: Uuid, page: Pagination) -> Result<(Vec<account::Model>, u64), ServiceError>;
    /// Lock the row, check `change` against it and write only the status
    /// columns. Balances are left to transaction posting.
    async fn set_status(&self, id: Uuid, change: StatusChange) -> Result<account::Model, ServiceError>;
    /// Over every live account, or one branch.
    async fn summary(&self, branch_id: Option<Uuid>) -> Result<AccountSummary, ServiceError>;
}
