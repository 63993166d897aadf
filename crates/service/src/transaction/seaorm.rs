use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use models::{account, transaction};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::transaction::domain::{Posting, TransactionStats};
use crate::transaction::repository::TransactionRepository;

pub struct SeaOrmTransactionRepository {
    pub db: DatabaseConnection,
}

fn db_err(e: sea_orm::DbErr) -> ServiceError { ServiceError::Db(e.to_string()) }

/// `SELECT ... FOR UPDATE` on one live account.
async fn lock_account(txn: &DatabaseTransaction, id: Uuid) -> Result<account::Model, ServiceError> {
    account::find_live()
        .filter(account::Column::Id.eq(id))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ServiceError::not_found("account"))
}

async fn save_balance(txn: &DatabaseTransaction, acc: account::Model) -> Result<(), ServiceError> {
    acc.into_active_model().reset_all().update(txn).await.map_err(db_err)?;
    Ok(())
}

fn touching(account_ids: &[Uuid]) -> Condition {
    Condition::any()
        .add(transaction::Column::FromAccountId.is_in(account_ids.iter().copied()))
        .add(transaction::Column::ToAccountId.is_in(account_ids.iter().copied()))
}

#[async_trait]
impl TransactionRepository for SeaOrmTransactionRepository {
    async fn post(&self, posting: Posting) -> Result<transaction::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // fixed lock order so concurrent transfers A->B and B->A cannot deadlock
        let mut locked = Vec::with_capacity(2);
        for id in posting.lock_order() {
            locked.push(lock_account(&txn, id).await?);
        }
        let (mut from, mut to) = (None, None);
        for acc in locked {
            if Some(acc.id) == posting.from {
                from = Some(acc);
            } else {
                to = Some(acc);
            }
        }

        let row = posting.apply(from.as_mut(), to.as_mut(), Utc::now())?;
        for acc in from.into_iter().chain(to) {
            save_balance(&txn, acc).await?;
        }
        let row = row
            .into_active_model()
            .reset_all()
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::from_db(e, "transaction reference"))?;
        txn.commit().await.map_err(db_err)?;
        debug!(reference = %row.reference, "posting committed");
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<transaction::Model>, ServiceError> {
        transaction::Entity::find_by_id(id).one(&self.db).await.map_err(db_err)
    }

    async fn list_for_account(&self, account_id: Uuid, page: Pagination) -> Result<(Vec<transaction::Model>, u64), ServiceError> {
        let (idx, per) = page.normalize();
        let paginator = transaction::find_for_account(account_id)
            .order_by_desc(transaction::Column::TransactionDate)
            .paginate(&self.db, per);
        let total = paginator.num_items().await.map_err(db_err)?;
        let items = paginator.fetch_page(idx).await.map_err(db_err)?;
        Ok((items, total))
    }

    async fn recent(&self, account_ids: &[Uuid], limit: u64) -> Result<Vec<transaction::Model>, ServiceError> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        transaction::Entity::find()
            .filter(touching(account_ids))
            .order_by_desc(transaction::Column::TransactionDate)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn stats(&self, since: Option<DateTime<Utc>>) -> Result<TransactionStats, ServiceError> {
        let mut q = transaction::Entity::find();
        if let Some(since) = since {
            q = q.filter(transaction::Column::TransactionDate.gte(since));
        }
        let rows = q.all(&self.db).await.map_err(db_err)?;
        let mut stats = TransactionStats::default();
        rows.iter().for_each(|t| stats.add(t));
        Ok(stats)
    }
}
