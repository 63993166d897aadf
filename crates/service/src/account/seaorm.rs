use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use models::{account, transaction};

use crate::account::domain::{AccountSummary, StatusChange};
use crate::account::repository::AccountRepository;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

pub struct SeaOrmAccountRepository {
    pub db: DatabaseConnection,
}

fn db_err(e: sea_orm::DbErr) -> ServiceError { ServiceError::Db(e.to_string()) }

#[async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn open(&self, account: account::Model, opening: Option<transaction::Model>) -> Result<account::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let created = account
            .into_active_model()
            .reset_all()
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::from_db(e, "account number"))?;
        if let Some(t) = opening {
            t.into_active_model()
                .reset_all()
                .insert(&txn)
                .await
                .map_err(|e| ServiceError::from_db(e, "transaction reference"))?;
        }
        txn.commit().await.map_err(db_err)?;
        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<account::Model>, ServiceError> {
        account::find_live().filter(account::Column::Id.eq(id)).one(&self.db).await.map_err(db_err)
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<account::Model>, ServiceError> {
        account::find_live().filter(account::Column::AccountNumber.eq(number)).one(&self.db).await.map_err(db_err)
    }

    async fn number_exists(&self, number: &str) -> Result<bool, ServiceError> {
        let n = account::Entity::find()
            .filter(account::Column::AccountNumber.eq(number))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(n > 0)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<account::Model>, ServiceError> {
        account::find_live()
            .filter(account::Column::UserId.eq(user_id))
            .order_by_asc(account::Column::OpenedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    async fn list_for_branch(&self, branch_id: Uuid, page: Pagination) -> Result<(Vec<account::Model>, u64), ServiceError> {
        let (idx, per) = page.normalize();
        let paginator = account::find_live()
            .filter(account::Column::BranchId.eq(branch_id))
            .order_by_desc(account::Column::OpenedAt)
            .paginate(&self.db, per);
        let total = paginator.num_items().await.map_err(db_err)?;
        let items = paginator.fetch_page(idx).await.map_err(db_err)?;
        Ok((items, total))
    }

    async fn set_status(&self, id: Uuid, change: StatusChange) -> Result<account::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let mut acc = account::find_live()
            .filter(account::Column::Id.eq(id))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| ServiceError::not_found("account"))?;
        change.check(&acc)?;
        change.apply(&mut acc, Utc::now());
        account::ActiveModel {
            id: Unchanged(acc.id),
            status: Set(acc.status.clone()),
            is_deleted: Set(acc.is_deleted),
            updated_at: Set(acc.updated_at),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| ServiceError::from_db(e, "account"))?;
        txn.commit().await.map_err(db_err)?;
        Ok(acc)
    }

    async fn summary(&self, branch_id: Option<Uuid>) -> Result<AccountSummary, ServiceError> {
        let mut q = account::find_live();
        if let Some(branch_id) = branch_id {
            q = q.filter(account::Column::BranchId.eq(branch_id));
        }
        let all = q.all(&self.db).await.map_err(db_err)?;
        Ok(AccountSummary::from_accounts(&all))
    }
}
