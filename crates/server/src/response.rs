use axum::response::{IntoResponse, Response};
use axum::Json;
use common::ApiEnvelope;
use serde::Serialize;

/// Successful handler output, wrapped in the envelope.
#[derive(Debug)]
pub struct ApiResponse<T>(pub ApiEnvelope<T>);

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self(ApiEnvelope::ok(data))
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self(ApiEnvelope::ok_with_message(data, message))
    }
}

impl ApiResponse<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self(ApiEnvelope::ok_with_message((), message))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}
