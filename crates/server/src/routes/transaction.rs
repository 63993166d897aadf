use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use service::pagination::Page;
use service::transaction::domain::{DepositInput, TransactionView, TransferInput, WithdrawInput};
use service::Actor;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::routes::PageQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// At most this many, newest first.
    pub limit: Option<u64>,
}

#[utoipa::path(post, path = "/api/transaction/deposit", tag = "transaction", security(("bearer" = [])), request_body = crate::openapi::DepositRequest, responses((status = 200, description = "Deposit posted", body = crate::openapi::EnvelopeDoc)))]
pub async fn deposit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<DepositInput>,
) -> Result<ApiResponse<TransactionView>, ApiError> {
    let txn = state.services.transactions.deposit(&actor, input).await?;
    Ok(ApiResponse::with_message(txn, "Deposit successful"))
}

#[utoipa::path(post, path = "/api/transaction/withdraw", tag = "transaction", security(("bearer" = [])), request_body = crate::openapi::WithdrawRequest, responses((status = 200, description = "Withdrawal posted", body = crate::openapi::EnvelopeDoc)))]
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<WithdrawInput>,
) -> Result<ApiResponse<TransactionView>, ApiError> {
    let txn = state.services.transactions.withdraw(&actor, input).await?;
    Ok(ApiResponse::with_message(txn, "Withdrawal successful"))
}

#[utoipa::path(post, path = "/api/transaction/transfer", tag = "transaction", security(("bearer" = [])), request_body = crate::openapi::TransferRequest, responses((status = 200, description = "Transfer posted; validation failures carry field errors", body = crate::openapi::EnvelopeDoc)))]
pub async fn transfer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<TransferInput>,
) -> Result<ApiResponse<TransactionView>, ApiError> {
    let txn = state.services.transactions.transfer(&actor, input).await?;
    Ok(ApiResponse::with_message(txn, "Transfer successful"))
}

#[utoipa::path(get, path = "/api/transaction/recent", tag = "transaction", security(("bearer" = [])), params(RecentQuery), responses((status = 200, description = "Recent transactions across the caller's accounts", body = crate::openapi::EnvelopeDoc)))]
pub async fn recent(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<RecentQuery>,
) -> Result<ApiResponse<Vec<TransactionView>>, ApiError> {
    Ok(ApiResponse::ok(state.services.transactions.recent_for_user(&actor, q.limit).await?))
}

#[utoipa::path(get, path = "/api/transaction/{id}", tag = "transaction", security(("bearer" = [])), params(("id" = Uuid, Path, description = "Transaction id")), responses((status = 200, description = "Transaction", body = crate::openapi::EnvelopeDoc)))]
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<TransactionView>, ApiError> {
    Ok(ApiResponse::ok(state.services.transactions.get(&actor, id).await?))
}

#[utoipa::path(get, path = "/api/transaction/account/{account_id}", tag = "transaction", security(("bearer" = [])), params(("account_id" = Uuid, Path, description = "Account id"), PageQuery), responses((status = 200, description = "Account history, newest first", body = crate::openapi::EnvelopeDoc)))]
pub async fn history(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(account_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<Page<TransactionView>>, ApiError> {
    Ok(ApiResponse::ok(state.services.transactions.history(&actor, account_id, page.into()).await?))
}
