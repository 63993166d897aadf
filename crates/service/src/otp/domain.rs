use chrono::{DateTime, Utc};
use models::enums::OtpPurpose;
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpInput {
    pub email: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpInput {
    pub email: String,
    pub purpose: OtpPurpose,
    pub code: String,
}

/// What the caller learns about an issued code; never the code itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OtpDispatch {
    pub email: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
}

pub fn check_code_format(errs: &mut ValidationErrors, code: &str) {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        errs.add("code", "code must be 6 digits");
    }
}

impl Validate for SendOtpInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.check("email", models::user::validate_email(&self.email));
        e.into_result()
    }
}

impl Validate for VerifyOtpInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.check("email", models::user::validate_email(&self.email));
        check_code_format(&mut e, &self.code);
        e.into_result()
    }
}
