use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use service::branch::domain::{BranchView, CreateBranchInput, UpdateBranchInput};
use service::Actor;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BranchListQuery {
    /// Admins only; ignored for everyone else.
    #[serde(default)]
    pub include_inactive: bool,
}

#[utoipa::path(get, path = "/api/branch", tag = "branch", responses((status = 200, description = "Active branches", body = crate::openapi::EnvelopeDoc)))]
pub async fn list_public(State(state): State<AppState>) -> Result<ApiResponse<Vec<BranchView>>, ApiError> {
    Ok(ApiResponse::ok(state.services.branches.list(None, false).await?))
}

#[utoipa::path(get, path = "/api/branch/all", tag = "branch", security(("bearer" = [])), params(BranchListQuery), responses((status = 200, description = "Branches, optionally including inactive ones", body = crate::openapi::EnvelopeDoc)))]
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<BranchListQuery>,
) -> Result<ApiResponse<Vec<BranchView>>, ApiError> {
    Ok(ApiResponse::ok(state.services.branches.list(Some(&actor), q.include_inactive).await?))
}

#[utoipa::path(get, path = "/api/branch/{id}", tag = "branch", params(("id" = Uuid, Path, description = "Branch id")), responses((status = 200, description = "Branch", body = crate::openapi::EnvelopeDoc)))]
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<ApiResponse<BranchView>, ApiError> {
    Ok(ApiResponse::ok(state.services.branches.get(id).await?))
}

#[utoipa::path(post, path = "/api/branch", tag = "branch", security(("bearer" = [])), request_body = crate::openapi::CreateBranchRequest, responses((status = 200, description = "Branch created; duplicates carry X-Status-Code 409", body = crate::openapi::EnvelopeDoc)))]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateBranchInput>,
) -> Result<ApiResponse<BranchView>, ApiError> {
    let branch = state.services.branches.create(&actor, input).await?;
    Ok(ApiResponse::with_message(branch, "Branch created"))
}

#[utoipa::path(put, path = "/api/branch/{id}", tag = "branch", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Branch id")), request_body = crate::openapi::UpdateBranchRequest, responses((status = 200, description = "Branch updated", body = crate::openapi::EnvelopeDoc)))]
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBranchInput>,
) -> Result<ApiResponse<BranchView>, ApiError> {
    let branch = state.services.branches.update(&actor, id, input).await?;
    Ok(ApiResponse::with_message(branch, "Branch updated"))
}

#[utoipa::path(delete, path = "/api/branch/{id}", tag = "branch", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Branch id")), responses((status = 200, description = "Branch deleted", body = crate::openapi::EnvelopeDoc)))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.services.branches.delete(&actor, id).await?;
    Ok(ApiResponse::done("Branch deleted"))
}
