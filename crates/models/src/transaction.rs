use sea_orm::{entity::prelude::*, Condition, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account;
use crate::enums::{TransactionStatus, TransactionType};
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub reference: String,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub amount: Decimal,
    pub transaction_type: String,
    pub status: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub from_balance_after: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub to_balance_after: Option<Decimal>,
    pub created_by: Option<Uuid>,
    pub transaction_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    FromAccount,
    ToAccount,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::FromAccount => Entity::belongs_to(account::Entity).from(Column::FromAccountId).to(account::Column::Id).into(),
            Relation::ToAccount => Entity::belongs_to(account::Entity).from(Column::ToAccountId).to(account::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> Result<TransactionType, ModelError> { self.transaction_type.parse() }
    pub fn state(&self) -> Result<TransactionStatus, ModelError> { self.status.parse() }

    /// Whether `account_id` is the source or destination.
    pub fn touches(&self, account_id: Uuid) -> bool {
        self.from_account_id == Some(account_id) || self.to_account_id == Some(account_id)
    }
}

/// Transactions where the account appears on either side.
pub fn find_for_account(account_id: Uuid) -> Select<Entity> {
    Entity::find().filter(
        Condition::any()
            .add(Column::FromAccountId.eq(account_id))
            .add(Column::ToAccountId.eq(account_id)),
    )
}
