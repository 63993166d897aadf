use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use service::otp::domain::OtpDispatch;
use service::user::domain::{RegisterInput, UserView};

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmailInput {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailCodeInput {
    pub email: String,
    pub code: String,
}

#[utoipa::path(post, path = "/api/registration/send-otp", tag = "registration", request_body = crate::openapi::EmailRequest, responses((status = 200, description = "Code sent; 409 when the email is registered", body = crate::openapi::EnvelopeDoc)))]
pub async fn send_otp(State(state): State<AppState>, Json(input): Json<EmailInput>) -> Result<ApiResponse<OtpDispatch>, ApiError> {
    let dispatch = state.services.registration.send_otp(&input.email).await?;
    Ok(ApiResponse::with_message(dispatch, "Verification code sent"))
}

#[utoipa::path(post, path = "/api/registration/verify-otp", tag = "registration", request_body = crate::openapi::EmailCodeRequest, responses((status = 200, description = "Code verified", body = crate::openapi::EnvelopeDoc)))]
pub async fn verify_otp(State(state): State<AppState>, Json(input): Json<EmailCodeInput>) -> Result<ApiResponse<()>, ApiError> {
    state.services.registration.verify_otp(&input.email, &input.code).await?;
    Ok(ApiResponse::done("Email verified"))
}

#[utoipa::path(post, path = "/api/registration/register", tag = "registration", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Customer registered", body = crate::openapi::EnvelopeDoc)))]
pub async fn register(State(state): State<AppState>, Json(input): Json<RegisterInput>) -> Result<ApiResponse<UserView>, ApiError> {
    let user = state.services.registration.register(input).await?;
    Ok(ApiResponse::with_message(user, "Registration successful"))
}
