use async_trait::async_trait;
use models::branch;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Reads never return soft-deleted branches.
#[async_trait]
pub trait BranchRepository: Send + Sync {
    async fn insert(&self, branch: branch::Model) -> Result<branch::Model, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<branch::Model>, ServiceError>;
    async fn code_or_ifsc_taken(&self, code: &str, ifsc: &str) -> Result<bool, ServiceError>;
    /// Ordered by code.
    async fn list(&self, include_inactive: bool) -> Result<Vec<branch::Model>, ServiceError>;
    async fn update(&self, branch: branch::Model) -> Result<branch::Model, ServiceError>;
    /// Accounts in the branch that are not closed or deleted.
    async fn count_open_accounts(&self, branch_id: Uuid) -> Result<u64, ServiceError>;
}
