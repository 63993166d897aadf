use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use service::pagination::{Page, Pagination};
use service::user::domain::{CreateManagerInput, UpdateUserStatusInput, UserFilter, UserView};
use service::Actor;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::routes::PageQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    /// `Admin`, `BranchManager` or `Customer`.
    #[param(value_type = Option<String>)]
    pub role: Option<models::enums::UserRole>,
    /// `PendingVerification`, `Active`, `Inactive` or `Suspended`.
    #[param(value_type = Option<String>)]
    pub status: Option<models::enums::UserStatus>,
    pub branch_id: Option<Uuid>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl UserQuery {
    fn split(self) -> (UserFilter, Pagination) {
        let page = PageQuery { page: self.page, per_page: self.per_page }.into();
        let filter = UserFilter { role: self.role, status: self.status, branch_id: self.branch_id, search: self.search };
        (filter, page)
    }
}

#[utoipa::path(get, path = "/api/admin/users", tag = "admin", security(("bearer" = [])), params(UserQuery), responses((status = 200, description = "Users matching the filter", body = crate::openapi::EnvelopeDoc)))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<UserQuery>,
) -> Result<ApiResponse<Page<UserView>>, ApiError> {
    let (filter, page) = q.split();
    Ok(ApiResponse::ok(state.services.users.list(&actor, filter, page).await?))
}

#[utoipa::path(get, path = "/api/admin/users/{id}", tag = "admin", security(("bearer" = [])), params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "User", body = crate::openapi::EnvelopeDoc)))]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserView>, ApiError> {
    Ok(ApiResponse::ok(state.services.users.get(&actor, id).await?))
}

#[utoipa::path(patch, path = "/api/admin/users/{id}/status", tag = "admin", security(("bearer" = [])), params(("id" = Uuid, Path, description = "User id")), request_body = crate::openapi::UserStatusRequest, responses((status = 200, description = "Status changed", body = crate::openapi::EnvelopeDoc)))]
pub async fn update_user_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserStatusInput>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let user = state.services.users.update_status(&actor, id, input).await?;
    Ok(ApiResponse::with_message(user, "User status updated"))
}

#[utoipa::path(post, path = "/api/admin/users/{id}/verify-kyc", tag = "admin", security(("bearer" = [])), params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "KYC verified", body = crate::openapi::EnvelopeDoc)))]
pub async fn verify_kyc(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let user = state.services.users.verify_kyc(&actor, id).await?;
    Ok(ApiResponse::with_message(user, "KYC verified"))
}

#[utoipa::path(delete, path = "/api/admin/users/{id}", tag = "admin", security(("bearer" = [])), params(("id" = Uuid, Path, description = "User id")), responses((status = 200, description = "User deleted", body = crate::openapi::EnvelopeDoc)))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.services.users.delete(&actor, id).await?;
    Ok(ApiResponse::done("User deleted"))
}

#[utoipa::path(post, path = "/api/admin/managers", tag = "admin", security(("bearer" = [])), request_body = crate::openapi::CreateManagerRequest, responses((status = 200, description = "Branch manager created", body = crate::openapi::EnvelopeDoc)))]
pub async fn create_manager(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateManagerInput>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let user = state.services.users.create_manager(&actor, input).await?;
    Ok(ApiResponse::with_message(user, "Branch manager created"))
}
