use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::Set;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

/// One row per user; `user_id` is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Set the user's password hash in a single statement, keeping the row id
/// and `created_at` when one already exists.
pub async fn upsert_password<C: ConnectionTrait>(db: &C, user_id: Uuid, password_hash: String, algorithm: &str) -> Result<Model, ModelError> {
    if password_hash.trim().is_empty() {
        return Err(ModelError::Validation("password hash required".into()));
    }
    let now: DateTimeWithTimeZone = Utc::now().into();
    let row = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        password_hash: Set(password_hash),
        password_algorithm: Set(algorithm.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let conflict = OnConflict::column(Column::UserId)
        .update_columns([Column::PasswordHash, Column::PasswordAlgorithm, Column::UpdatedAt])
        .to_owned();
    Ok(Entity::insert(row).on_conflict(conflict).exec_with_returning(db).await?)
}
