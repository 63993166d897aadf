use sea_orm::{DatabaseConnection, EntityTrait, ColumnTrait, QueryFilter};
use uuid::Uuid;

use models::{user, user_credentials};

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(u: user::Model) -> Result<AuthUser, AuthError> {
    Ok(AuthUser {
        role: u.role().map_err(|e| AuthError::Repository(e.to_string()))?,
        status: u.status().map_err(|e| AuthError::Repository(e.to_string()))?,
        id: u.id,
        email: u.email,
        name: u.full_name,
        branch_id: u.branch_id,
    })
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_live()
            .filter(user::Column::Email.eq(email.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        res.map(to_auth_user).transpose()
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_live()
            .filter(user::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        res.map(to_auth_user).transpose()
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::Entity::find()
            .filter(user_credentials::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }
}
