use axum::extract::State;
use axum::Extension;
use service::dashboard::{AdminDashboard, CustomerDashboard, ManagerDashboard};
use service::Actor;

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[utoipa::path(get, path = "/api/dashboard/admin", tag = "dashboard", security(("bearer" = [])), responses((status = 200, description = "Bank-wide figures", body = crate::openapi::EnvelopeDoc)))]
pub async fn admin(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> Result<ApiResponse<AdminDashboard>, ApiError> {
    Ok(ApiResponse::ok(state.services.dashboard.admin(&actor).await?))
}

#[utoipa::path(get, path = "/api/dashboard/manager", tag = "dashboard", security(("bearer" = [])), responses((status = 200, description = "Figures for the manager's branch", body = crate::openapi::EnvelopeDoc)))]
pub async fn manager(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> Result<ApiResponse<ManagerDashboard>, ApiError> {
    Ok(ApiResponse::ok(state.services.dashboard.manager(&actor).await?))
}

#[utoipa::path(get, path = "/api/dashboard/customer", tag = "dashboard", security(("bearer" = [])), responses((status = 200, description = "Caller's accounts and recent activity", body = crate::openapi::EnvelopeDoc)))]
pub async fn customer(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> Result<ApiResponse<CustomerDashboard>, ApiError> {
    Ok(ApiResponse::ok(state.services.dashboard.customer(&actor).await?))
}
