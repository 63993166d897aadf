use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::Serialize;
use service::auth::domain::{AuthUser, ChangePasswordInput, ForgotPasswordInput, LoginInput, ResetPasswordInput};
use service::Actor;
use tracing::info;

use crate::errors::ApiError;
use crate::middleware::AUTH_COOKIE;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in; failures carry X-Status-Code 401/403", body = crate::openapi::EnvelopeDoc)))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, ApiResponse<LoginOutput>), ApiError> {
    let session = state.services.auth.login(input).await?;
    let jar = jar.add(session_cookie(session.token.clone(), state.secure_cookies));
    let out = LoginOutput { user: session.user, token: session.token, expires_at: session.expires_at };
    Ok((jar, ApiResponse::with_message(out, "Login successful")))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 200, description = "Cookie cleared", body = crate::openapi::EnvelopeDoc)))]
pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<()>) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, ApiResponse::done("Logged out"))
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", security(("bearer" = [])), responses((status = 200, description = "Current user", body = crate::openapi::EnvelopeDoc)))]
pub async fn me(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> Result<ApiResponse<AuthUser>, ApiError> {
    let user = state.services.auth.me(actor.user_id).await?;
    Ok(ApiResponse::ok(user))
}

#[utoipa::path(post, path = "/api/auth/change-password", tag = "auth", security(("bearer" = [])), request_body = crate::openapi::ChangePasswordRequest, responses((status = 200, description = "Password changed", body = crate::openapi::EnvelopeDoc)))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<ChangePasswordInput>,
) -> Result<ApiResponse<()>, ApiError> {
    state.services.auth.change_password(actor.user_id, input).await?;
    Ok(ApiResponse::done("Password changed"))
}

#[utoipa::path(post, path = "/api/auth/forgot-password", tag = "auth", request_body = crate::openapi::ForgotPasswordRequest, responses((status = 200, description = "Reset code sent if the email is registered", body = crate::openapi::EnvelopeDoc)))]
pub async fn forgot_password(State(state): State<AppState>, Json(input): Json<ForgotPasswordInput>) -> Result<ApiResponse<()>, ApiError> {
    state.services.auth.forgot_password(input).await?;
    Ok(ApiResponse::done("If the email is registered, a reset code has been sent"))
}

#[utoipa::path(post, path = "/api/auth/reset-password", tag = "auth", request_body = crate::openapi::ResetPasswordRequest, responses((status = 200, description = "Password reset", body = crate::openapi::EnvelopeDoc)))]
pub async fn reset_password(State(state): State<AppState>, Json(input): Json<ResetPasswordInput>) -> Result<ApiResponse<()>, ApiError> {
    let email = input.email.clone();
    state.services.auth.reset_password(input).await?;
    info!(%email, "password_reset_via_otp");
    Ok(ApiResponse::done("Password has been reset"))
}
