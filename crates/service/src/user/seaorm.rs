use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use sea_orm::sea_query::{Expr, Func};
use uuid::Uuid;

use models::enums::{AccountStatus, UserRole};
use models::{account, user, user_credentials};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::user::domain::UserFilter;
use crate::user::repository::UserRepository;

pub struct SeaOrmUserRepository {
    pub db: DatabaseConnection,
}

fn db_err(e: sea_orm::DbErr) -> ServiceError { ServiceError::Db(e.to_string()) }

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, user: user::Model, password_hash: String, password_algorithm: String) -> Result<user::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let created = user
            .into_active_model()
            .reset_all()
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::from_db(e, "email"))?;
        user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<user::Model>, ServiceError> {
        user::find_live().filter(user::Column::Id.eq(id)).one(&self.db).await.map_err(db_err)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        user::find_live().filter(user::Column::Email.eq(email)).one(&self.db).await.map_err(db_err)
    }

    async fn email_taken(&self, email: &str) -> Result<bool, ServiceError> {
        let n = user::Entity::find().filter(user::Column::Email.eq(email)).count(&self.db).await.map_err(db_err)?;
        Ok(n > 0)
    }

    async fn list(&self, filter: &UserFilter, page: Pagination) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let mut q = user::find_live();
        if let Some(role) = filter.role {
            q = q.filter(user::Column::Role.eq(role.as_str()));
        }
        if let Some(status) = filter.status {
            q = q.filter(user::Column::Status.eq(status.as_str()));
        }
        if let Some(branch_id) = filter.branch_id {
            q = q.filter(user::Column::BranchId.eq(branch_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            q = q.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(user::Column::FullName))).like(pattern.clone()))
                    .add(user::Column::Email.like(pattern)),
            );
        }
        let (idx, per) = page.normalize();
        let paginator = q.order_by_desc(user::Column::CreatedAt).paginate(&self.db, per);
        let total = paginator.num_items().await.map_err(db_err)?;
        let items = paginator.fetch_page(idx).await.map_err(db_err)?;
        Ok((items, total))
    }

    async fn update(&self, user: user::Model) -> Result<user::Model, ServiceError> {
        user.into_active_model()
            .reset_all()
            .update(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "user"))
    }

    async fn count_open_accounts(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        account::find_live()
            .filter(account::Column::UserId.eq(user_id))
            .filter(account::Column::Status.ne(AccountStatus::Closed.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn count_by_role(&self, role: UserRole, branch_id: Option<Uuid>) -> Result<u64, ServiceError> {
        let mut q = user::find_live().filter(user::Column::Role.eq(role.as_str()));
        if let Some(branch_id) = branch_id {
            q = q.filter(user::Column::BranchId.eq(branch_id));
        }
        q.count(&self.db).await.map_err(db_err)
    }
}
