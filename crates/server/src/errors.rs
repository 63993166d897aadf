use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::{ApiEnvelope, FieldErrors};
use service::auth::errors::AuthError;
use service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// Header carrying the status a failed request would have had.
pub const STATUS_HEADER: &str = "x-status-code";

/// Handler failure rendered as a `success: false` envelope.
///
/// The transport status is always 200; the intended status travels in
/// `X-Status-Code`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: u16,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: u16, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), errors: None }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, 2005, message)
    }

    fn validation(code: u16, errors: FieldErrors) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code, message: "Validation failed".into(), errors: Some(errors) }
    }

    fn internal(code: u16) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, "An unexpected error occurred")
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        match e {
            ServiceError::Validation(errs) => Self::validation(code, errs.into_inner()),
            ServiceError::NotFound(m) => Self::new(StatusCode::NOT_FOUND, code, m),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, code, m),
            ServiceError::Forbidden(m) => Self::new(StatusCode::FORBIDDEN, code, m),
            ServiceError::Unauthorized(m) => Self::new(StatusCode::UNAUTHORIZED, code, m),
            ServiceError::Rule(v) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, v.to_string()),
            ServiceError::Model(m) => Self::new(StatusCode::BAD_REQUEST, code, m.to_string()),
            ServiceError::Db(m) | ServiceError::Internal(m) => {
                error!(code, error = %m, "service failure");
                Self::internal(code)
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let code = e.code();
        match e {
            AuthError::Service(inner) => inner.into(),
            AuthError::Validation(errs) => Self::validation(code, errs.into_inner()),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, code, "user not found"),
            AuthError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, code, "Invalid email or password"),
            AuthError::Inactive => Self::new(StatusCode::FORBIDDEN, code, "Account is not active"),
            AuthError::TokenExpired => Self::new(StatusCode::UNAUTHORIZED, code, "Session expired"),
            AuthError::InvalidToken(_) => Self::new(StatusCode::UNAUTHORIZED, code, "Invalid token"),
            AuthError::HashError(m) | AuthError::TokenError(m) | AuthError::Repository(m) => {
                error!(code, error = %m, "auth failure");
                Self::internal(code)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            warn!(status = self.status.as_u16(), code = self.code, message = %self.message, "request_failed");
        }
        let envelope: ApiEnvelope<()> = match self.errors {
            Some(errors) => ApiEnvelope::fail_with_errors(self.message, errors),
            None => ApiEnvelope::fail(self.message),
        };
        let mut resp = (StatusCode::OK, Json(envelope)).into_response();
        resp.headers_mut().insert(STATUS_HEADER, HeaderValue::from(self.status.as_u16()));
        resp
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
