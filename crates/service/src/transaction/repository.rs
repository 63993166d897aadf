use async_trait::async_trait;
use chrono::{DateTime, Utc};
use models::transaction;
use uuid::Uuid;

use super::domain::{Posting, TransactionStats};
use crate::errors::ServiceError;
use crate::pagination::Pagination;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Apply `posting` atomically: lock the accounts involved, re-check the
    /// rules against their current state, update balances and record the
    /// ledger row.
    async fn post(&self, posting: Posting) -> Result<transaction::Model, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<transaction::Model>, ServiceError>;
    /// Newest first, with the total before paging.
    async fn list_for_account(&self, account_id: Uuid, page: Pagination) -> Result<(Vec<transaction::Model>, u64), ServiceError>;
    /// Newest transactions touching any of `account_ids`.
    async fn recent(&self, account_ids: &[Uuid], limit: u64) -> Result<Vec<transaction::Model>, ServiceError>;
    /// Totals since `since`, or over all time.
    async fn stats(&self, since: Option<DateTime<Utc>>) -> Result<TransactionStats, ServiceError>;
}
