use sea_orm::{entity::prelude::*, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::OtpPurpose;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "otp_verification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub code: String,
    pub purpose: String,
    pub expires_at: DateTimeWithTimeZone,
    pub attempt_count: i32,
    pub is_verified: bool,
    pub is_used: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Unused codes for an email + purpose, newest first.
pub fn find_open(email: &str, purpose: OtpPurpose) -> Select<Entity> {
    Entity::find()
        .filter(Column::Email.eq(email.to_string()))
        .filter(Column::Purpose.eq(purpose.as_str()))
        .filter(Column::IsUsed.eq(false))
        .order_by_desc(Column::CreatedAt)
}
