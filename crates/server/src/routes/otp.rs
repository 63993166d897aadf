use axum::extract::State;
use axum::Json;
use service::otp::domain::{OtpDispatch, SendOtpInput, VerifyOtpInput};
use service::validation::Validate;
use service::ServiceError;

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[utoipa::path(post, path = "/api/otp/send", tag = "otp", request_body = crate::openapi::SendOtpRequest, responses((status = 200, description = "Code sent", body = crate::openapi::EnvelopeDoc)))]
pub async fn send(State(state): State<AppState>, Json(input): Json<SendOtpInput>) -> Result<ApiResponse<OtpDispatch>, ApiError> {
    input.validate().map_err(ServiceError::from)?;
    let dispatch = state.services.otp.send(&input.email, input.purpose, None).await?;
    Ok(ApiResponse::with_message(dispatch, "Verification code sent"))
}

#[utoipa::path(post, path = "/api/otp/verify", tag = "otp", request_body = crate::openapi::VerifyOtpRequest, responses((status = 200, description = "Code verified", body = crate::openapi::EnvelopeDoc)))]
pub async fn verify(State(state): State<AppState>, Json(input): Json<VerifyOtpInput>) -> Result<ApiResponse<()>, ApiError> {
    input.validate().map_err(ServiceError::from)?;
    state.services.otp.verify(&input.email, input.purpose, &input.code).await?;
    Ok(ApiResponse::done("Code verified"))
}
