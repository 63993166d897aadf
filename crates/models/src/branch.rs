use sea_orm::{entity::prelude::*, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::BranchType;
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "branch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    #[sea_orm(unique)]
    pub ifsc: String,
    pub branch_type: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> Result<BranchType, ModelError> {
        self.branch_type.parse()
    }
}

/// Branches that have not been soft-deleted.
pub fn find_live() -> Select<Entity> {
    Entity::find().filter(Column::IsDeleted.eq(false))
}

/// Branch codes are 3..=10 upper-case letters or digits.
pub fn validate_code(code: &str) -> Result<(), ModelError> {
    let ok = (3..=10).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if ok { Ok(()) } else { Err(ModelError::Validation("branch code must be 3-10 upper-case letters or digits".into())) }
}

/// IFSC: four letters, a literal `0`, then six letters or digits.
pub fn validate_ifsc(ifsc: &str) -> Result<(), ModelError> {
    let b = ifsc.as_bytes();
    let ok = b.len() == 11
        && b[..4].iter().all(|c| c.is_ascii_uppercase())
        && b[4] == b'0'
        && b[5..].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if ok { Ok(()) } else { Err(ModelError::Validation("invalid IFSC format (e.g. SBIN0001234)".into())) }
}
