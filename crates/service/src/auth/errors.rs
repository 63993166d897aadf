use thiserror::Error;

use crate::errors::ServiceError;
use crate::validation::ValidationErrors;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("account is not active")]
    Inactive,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::NotFound => 1003,
            AuthError::Unauthorized => 1004,
            AuthError::Inactive => 1005,
            AuthError::TokenExpired => 1006,
            AuthError::InvalidToken(_) => 1007,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
            AuthError::Service(e) => e.code(),
        }
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(errs: ValidationErrors) -> Self { AuthError::Validation(errs) }
}
