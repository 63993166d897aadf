use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use service::account::domain::{AccountView, OpenAccountInput, UpdateAccountStatusInput};
use service::pagination::Page;
use service::Actor;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::routes::PageQuery;
use crate::state::AppState;

#[utoipa::path(post, path = "/api/account", tag = "account", security(("bearer" = [])), request_body = crate::openapi::OpenAccountRequest, responses((status = 200, description = "Account opened", body = crate::openapi::EnvelopeDoc)))]
pub async fn open(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<OpenAccountInput>,
) -> Result<ApiResponse<AccountView>, ApiError> {
    let account = state.services.accounts.open(&actor, input).await?;
    Ok(ApiResponse::with_message(account, "Account opened"))
}

#[utoipa::path(get, path = "/api/account/my", tag = "account", security(("bearer" = [])), responses((status = 200, description = "Caller's accounts", body = crate::openapi::EnvelopeDoc)))]
pub async fn list_mine(State(state): State<AppState>, Extension(actor): Extension<Actor>) -> Result<ApiResponse<Vec<AccountView>>, ApiError> {
    Ok(ApiResponse::ok(state.services.accounts.list_mine(&actor).await?))
}

#[utoipa::path(get, path = "/api/account/{id}", tag = "account", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Account id")), responses((status = 200, description = "Account", body = crate::openapi::EnvelopeDoc)))]
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AccountView>, ApiError> {
    Ok(ApiResponse::ok(state.services.accounts.get(&actor, id).await?))
}

#[utoipa::path(get, path = "/api/account/number/{number}", tag = "account", security(("bearer" = [])), params(("number" = String, Path, description = "12-digit account number")), responses((status = 200, description = "Account", body = crate::openapi::EnvelopeDoc)))]
pub async fn get_by_number(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(number): Path<String>,
) -> Result<ApiResponse<AccountView>, ApiError> {
    Ok(ApiResponse::ok(state.services.accounts.get_by_number(&actor, &number).await?))
}

#[utoipa::path(get, path = "/api/account/user/{user_id}", tag = "account", security(("bearer" = [])), params(("user_id" = Uuid, Path, description = "Owner id")), responses((status = 200, description = "Accounts of a user", body = crate::openapi::EnvelopeDoc)))]
pub async fn list_for_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<AccountView>>, ApiError> {
    Ok(ApiResponse::ok(state.services.accounts.list_for_user(&actor, user_id).await?))
}

#[utoipa::path(get, path = "/api/account/branch/{branch_id}", tag = "account", security(("bearer" = [])), params(("branch_id" = Uuid, Path, description = "Branch id"), PageQuery), responses((status = 200, description = "Accounts held at a branch", body = crate::openapi::EnvelopeDoc)))]
pub async fn list_for_branch(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(branch_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<Page<AccountView>>, ApiError> {
    Ok(ApiResponse::ok(state.services.accounts.list_for_branch(&actor, branch_id, page.into()).await?))
}

#[utoipa::path(patch, path = "/api/account/{id}/status", tag = "account", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Account id")), request_body = crate::openapi::AccountStatusRequest, responses((status = 200, description = "Status changed", body = crate::openapi::EnvelopeDoc)))]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateAccountStatusInput>,
) -> Result<ApiResponse<AccountView>, ApiError> {
    let account = state.services.accounts.update_status(&actor, id, input).await?;
    Ok(ApiResponse::with_message(account, "Account status updated"))
}

#[utoipa::path(delete, path = "/api/account/{id}", tag = "account", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Account id")), responses((status = 200, description = "Account deleted", body = crate::openapi::EnvelopeDoc)))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.services.accounts.delete(&actor, id).await?;
    Ok(ApiResponse::done("Account deleted"))
}
