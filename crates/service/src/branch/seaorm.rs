use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use models::enums::AccountStatus;
use models::{account, branch};

use crate::branch::repository::BranchRepository;
use crate::errors::ServiceError;

pub struct SeaOrmBranchRepository {
    pub db: DatabaseConnection,
}

fn db_err(e: sea_orm::DbErr) -> ServiceError { ServiceError::Db(e.to_string()) }

#[async_trait]
impl BranchRepository for SeaOrmBranchRepository {
    async fn insert(&self, branch: branch::Model) -> Result<branch::Model, ServiceError> {
        branch
            .into_active_model()
            .reset_all()
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "branch code or IFSC"))
    }

    async fn find(&self, id: Uuid) -> Result<Option<branch::Model>, ServiceError> {
        branch::find_live().filter(branch::Column::Id.eq(id)).one(&self.db).await.map_err(db_err)
    }

    async fn code_or_ifsc_taken(&self, code: &str, ifsc: &str) -> Result<bool, ServiceError> {
        // deleted branches keep their codes
        let n = branch::Entity::find()
            .filter(Condition::any().add(branch::Column::Code.eq(code)).add(branch::Column::Ifsc.eq(ifsc)))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(n > 0)
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<branch::Model>, ServiceError> {
        let mut q = branch::find_live();
        if !include_inactive {
            q = q.filter(branch::Column::IsActive.eq(true));
        }
        q.order_by_asc(branch::Column::Code).all(&self.db).await.map_err(db_err)
    }

    async fn update(&self, branch: branch::Model) -> Result<branch::Model, ServiceError> {
        branch
            .into_active_model()
            .reset_all()
            .update(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "branch"))
    }

    async fn count_open_accounts(&self, branch_id: Uuid) -> Result<u64, ServiceError> {
        account::find_live()
            .filter(account::Column::BranchId.eq(branch_id))
            .filter(account::Column::Status.ne(AccountStatus::Closed.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}
