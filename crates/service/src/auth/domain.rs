use chrono::{DateTime, Utc};
use models::enums::{UserRole, UserStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{Validate, ValidationErrors};

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub branch_id: Option<Uuid>,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// At least 8 characters with a letter and a digit.
pub fn check_password_strength(errs: &mut ValidationErrors, field: &str, password: &str) {
    if password.chars().count() < 8 {
        errs.add(field, "password too short (>=8)");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit()) {
        errs.add(field, "password must contain a letter and a digit");
    }
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.require("email", &self.email);
        e.require("password", &self.password);
        e.into_result()
    }
}

impl Validate for ChangePasswordInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.require("current_password", &self.current_password);
        check_password_strength(&mut e, "new_password", &self.new_password);
        if self.current_password == self.new_password {
            e.add("new_password", "new password must differ from the current one");
        }
        e.into_result()
    }
}

impl Validate for ResetPasswordInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.check("email", models::user::validate_email(&self.email));
        if self.code.len() != 6 || !self.code.chars().all(|c| c.is_ascii_digit()) {
            e.add("code", "code must be 6 digits");
        }
        check_password_strength(&mut e, "new_password", &self.new_password);
        e.into_result()
    }
}
