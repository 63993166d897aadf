use sea_orm::{entity::prelude::*, QueryFilter};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::branch;
use crate::enums::{UserRole, UserStatus};
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub status: String,
    pub branch_id: Option<Uuid>,
    pub date_of_birth: Option<Date>,
    pub address: Option<String>,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,
    pub kyc_verified: bool,
    pub email_verified: bool,
    pub is_deleted: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Branch,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Branch => Entity::belongs_to(branch::Entity).from(Column::BranchId).to(branch::Column::Id).into() }
    }
}

impl Related<branch::Entity> for Entity {
    fn to() -> RelationDef { Relation::Branch.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn role(&self) -> Result<UserRole, ModelError> { self.role.parse() }
    pub fn status(&self) -> Result<UserStatus, ModelError> { self.status.parse() }
}

/// Users that have not been soft-deleted.
pub fn find_live() -> Select<Entity> {
    Entity::find().filter(Column::IsDeleted.eq(false))
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid || email.len() > 255 || email.contains(char::is_whitespace) {
        return Err(ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let n = name.trim();
    if n.is_empty() { return Err(ModelError::Validation("name required".into())); }
    if n.chars().count() > 128 { return Err(ModelError::Validation("name too long (<=128)".into())); }
    Ok(())
}

/// Indian mobile number: 10 digits starting 6-9, optional `+91` prefix.
pub fn validate_phone(phone: &str) -> Result<(), ModelError> {
    let digits = phone.strip_prefix("+91").unwrap_or(phone);
    let ok = digits.len() == 10
        && digits.chars().all(|c| c.is_ascii_digit())
        && matches!(digits.as_bytes()[0], b'6'..=b'9');
    if ok { Ok(()) } else { Err(ModelError::Validation("invalid phone number".into())) }
}

/// PAN: five letters, four digits, one letter.
pub fn validate_pan(pan: &str) -> Result<(), ModelError> {
    let b = pan.as_bytes();
    let ok = b.len() == 10
        && b[..5].iter().all(|c| c.is_ascii_uppercase())
        && b[5..9].iter().all(|c| c.is_ascii_digit())
        && b[9].is_ascii_uppercase();
    if ok { Ok(()) } else { Err(ModelError::Validation("invalid PAN format (e.g. ABCDE1234F)".into())) }
}

pub fn validate_aadhaar(aadhaar: &str) -> Result<(), ModelError> {
    let ok = aadhaar.len() == 12 && aadhaar.chars().all(|c| c.is_ascii_digit()) && !aadhaar.starts_with(['0', '1']);
    if ok { Ok(()) } else { Err(ModelError::Validation("invalid Aadhaar number".into())) }
}
