use chrono::{DateTime, Utc};
use models::branch;
use models::enums::BranchType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBranchInput {
    pub code: String,
    pub name: String,
    pub ifsc: String,
    pub branch_type: BranchType,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBranchInput {
    pub name: Option<String>,
    pub branch_type: Option<BranchType>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BranchView {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub ifsc: String,
    pub branch_type: BranchType,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<branch::Model> for BranchView {
    type Error = ServiceError;

    fn try_from(b: branch::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            branch_type: b.kind()?,
            id: b.id,
            code: b.code,
            name: b.name,
            ifsc: b.ifsc,
            address: b.address,
            city: b.city,
            state: b.state,
            phone: b.phone,
            is_active: b.is_active,
            created_at: b.created_at.with_timezone(&Utc),
        })
    }
}

impl Validate for CreateBranchInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.check("code", branch::validate_code(&self.code));
        e.check("ifsc", branch::validate_ifsc(&self.ifsc));
        e.require("name", &self.name);
        e.max_len("name", &self.name, 128);
        e.require("address", &self.address);
        e.max_len("address", &self.address, 250);
        e.require("city", &self.city);
        e.require("state", &self.state);
        e.check("phone", models::user::validate_phone(&self.phone));
        e.into_result()
    }
}

impl Validate for UpdateBranchInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        if let Some(name) = &self.name {
            e.require("name", name);
            e.max_len("name", name, 128);
        }
        if let Some(address) = &self.address {
            e.require("address", address);
            e.max_len("address", address, 250);
        }
        if let Some(city) = &self.city {
            e.require("city", city);
        }
        if let Some(state) = &self.state {
            e.require("state", state);
        }
        if let Some(phone) = &self.phone {
            e.check("phone", models::user::validate_phone(phone));
        }
        e.into_result()
    }
}
