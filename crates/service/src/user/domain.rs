use chrono::{DateTime, NaiveDate, Utc};
use models::enums::{UserRole, UserStatus};
use models::user;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::domain::check_password_strength;
use crate::errors::ServiceError;
use crate::validation::{Validate, ValidationErrors};

pub const MIN_CUSTOMER_AGE: i32 = 18;

/// Customer self-registration, submitted after the email OTP is verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub password: String,
    pub branch_id: Uuid,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub pan_number: String,
    pub aadhaar_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateManagerInput {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub password: String,
    pub branch_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateUserStatusInput {
    pub status: UserStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub branch_id: Option<Uuid>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, u: &user::Model) -> bool {
        if self.role.is_some_and(|r| r.as_str() != u.role) { return false; }
        if self.status.is_some_and(|s| s.as_str() != u.status) { return false; }
        if self.branch_id.is_some() && self.branch_id != u.branch_id { return false; }
        if let Some(q) = self.search.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty()) {
            return u.full_name.to_lowercase().contains(&q) || u.email.contains(&q);
        }
        true
    }
}

/// Public view of a user. Aadhaar numbers are masked to the last four digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub branch_id: Option<Uuid>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,
    pub kyc_verified: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

pub fn mask_aadhaar(aadhaar: &str) -> String {
    let keep = aadhaar.len().saturating_sub(4);
    format!("{}{}", "X".repeat(keep), &aadhaar[keep..])
}

impl TryFrom<user::Model> for UserView {
    type Error = ServiceError;

    fn try_from(u: user::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: u.role()?,
            status: u.status()?,
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            phone: u.phone,
            branch_id: u.branch_id,
            date_of_birth: u.date_of_birth,
            address: u.address,
            pan_number: u.pan_number,
            aadhaar_number: u.aadhaar_number.as_deref().map(mask_aadhaar),
            kyc_verified: u.kyc_verified,
            email_verified: u.email_verified,
            created_at: u.created_at.with_timezone(&Utc),
        })
    }
}

/// Whole years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    today.years_since(dob).map(|y| y as i32).unwrap_or(-1)
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.check("email", user::validate_email(&self.email));
        e.check("full_name", user::validate_name(&self.full_name));
        e.check("phone", user::validate_phone(&self.phone));
        check_password_strength(&mut e, "password", &self.password);
        e.check("pan_number", user::validate_pan(&self.pan_number));
        e.check("aadhaar_number", user::validate_aadhaar(&self.aadhaar_number));
        e.require("address", &self.address);
        e.max_len("address", &self.address, 250);
        if age_on(self.date_of_birth, Utc::now().date_naive()) < MIN_CUSTOMER_AGE {
            e.add("date_of_birth", format!("customer must be at least {} years old", MIN_CUSTOMER_AGE));
        }
        e.into_result()
    }
}

impl Validate for CreateManagerInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.check("email", user::validate_email(&self.email));
        e.check("full_name", user::validate_name(&self.full_name));
        e.check("phone", user::validate_phone(&self.phone));
        check_password_strength(&mut e, "password", &self.password);
        e.into_result()
    }
}
