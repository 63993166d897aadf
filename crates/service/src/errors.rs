use sea_orm::DbErr;
use thiserror::Error;

use crate::rules::RuleViolation;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn forbidden(reason: impl Into<String>) -> Self { Self::Forbidden(reason.into()) }

    /// Map a database error, surfacing unique-constraint violations as conflicts.
    pub fn from_db(err: DbErr, what: &str) -> Self {
        if models::db::is_unique_violation(&err) {
            Self::Conflict(format!("{} already exists", what))
        } else {
            Self::Db(err.to_string())
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 2001,
            ServiceError::NotFound(_) => 2002,
            ServiceError::Conflict(_) => 2003,
            ServiceError::Forbidden(_) => 2004,
            ServiceError::Unauthorized(_) => 2005,
            ServiceError::Rule(_) => 2101,
            ServiceError::Model(_) => 2201,
            ServiceError::Db(_) => 2300,
            ServiceError::Internal(_) => 2400,
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errs: ValidationErrors) -> Self { ServiceError::Validation(errs) }
}
