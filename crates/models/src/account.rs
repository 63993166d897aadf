use sea_orm::{entity::prelude::*, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{AccountStatus, AccountType};
use crate::errors::ModelError;
use crate::{branch, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub account_number: String,
    pub user_id: Uuid,
    pub branch_id: Uuid,
    pub account_type: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub balance: Decimal,
    pub status: String,
    pub is_deleted: bool,
    pub created_by: Option<Uuid>,
    pub opened_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Branch,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Branch => Entity::belongs_to(branch::Entity).from(Column::BranchId).to(branch::Column::Id).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<branch::Entity> for Entity {
    fn to() -> RelationDef { Relation::Branch.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> Result<AccountType, ModelError> { self.account_type.parse() }
    pub fn state(&self) -> Result<AccountStatus, ModelError> { self.status.parse() }
}

/// Accounts that have not been soft-deleted.
pub fn find_live() -> Select<Entity> {
    Entity::find().filter(Column::IsDeleted.eq(false))
}

/// Account numbers are exactly 12 digits with no leading zero.
pub fn validate_account_number(number: &str) -> Result<(), ModelError> {
    let ok = number.len() == 12 && number.chars().all(|c| c.is_ascii_digit()) && !number.starts_with('0');
    if ok { Ok(()) } else { Err(ModelError::Validation("account number must be 12 digits".into())) }
}
