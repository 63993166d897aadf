use async_trait::async_trait;
use sea_orm::{sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter};
use uuid::Uuid;

use models::enums::OtpPurpose;
use models::otp_verification::{self, Column, Entity};

use crate::errors::ServiceError;
use crate::otp::repository::OtpRepository;

pub struct SeaOrmOtpRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl OtpRepository for SeaOrmOtpRepository {
    async fn invalidate_open(&self, email: &str, purpose: OtpPurpose) -> Result<u64, ServiceError> {
        let res = Entity::update_many()
            .col_expr(Column::IsUsed, Expr::value(true))
            .filter(Column::Email.eq(email.to_string()))
            .filter(Column::Purpose.eq(purpose.as_str()))
            .filter(Column::IsUsed.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected)
    }

    async fn insert(&self, otp: otp_verification::Model) -> Result<otp_verification::Model, ServiceError> {
        otp.into_active_model()
            .reset_all()
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::from_db(e, "otp"))
    }

    async fn latest_open(&self, email: &str, purpose: OtpPurpose) -> Result<Option<otp_verification::Model>, ServiceError> {
        otp_verification::find_open(email, purpose)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn record_attempt(&self, id: Uuid, max_attempts: i32) -> Result<bool, ServiceError> {
        let res = Entity::update_many()
            .col_expr(Column::AttemptCount, Expr::col(Column::AttemptCount).add(1))
            .filter(Column::Id.eq(id))
            .filter(Column::AttemptCount.lt(max_attempts))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected == 1)
    }

    async fn mark_verified(&self, id: Uuid, max_attempts: i32) -> Result<bool, ServiceError> {
        let res = Entity::update_many()
            .col_expr(Column::IsVerified, Expr::value(true))
            .filter(Column::Id.eq(id))
            .filter(Column::IsUsed.eq(false))
            .filter(Column::AttemptCount.lt(max_attempts))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected == 1)
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = Entity::update_many()
            .col_expr(Column::IsUsed, Expr::value(true))
            .filter(Column::Id.eq(id))
            .filter(Column::IsVerified.eq(true))
            .filter(Column::IsUsed.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected == 1)
    }
}
