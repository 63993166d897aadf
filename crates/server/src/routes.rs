use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, patch, post};
use axum::{middleware, Json, Router};
use serde::Deserialize;
use service::pagination::Pagination;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::middleware as mw;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod account;
pub mod admin;
pub mod auth;
pub mod branch;
pub mod dashboard;
pub mod otp;
pub mod registration;
pub mod transaction;

/// `?page=&per_page=`; missing values fall back to page 1 of 20.
#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let d = Pagination::default();
        Pagination { page: q.page.unwrap_or(d.page), per_page: q.per_page.unwrap_or(d.per_page) }
    }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn public_api() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/registration/send-otp", post(registration::send_otp))
        .route("/registration/verify-otp", post(registration::verify_otp))
        .route("/registration/register", post(registration::register))
        .route("/otp/send", post(otp::send))
        .route("/otp/verify", post(otp::verify))
        .route("/branch", get(branch::list_public))
        .route("/branch/:id", get(branch::get))
}

fn protected_api(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/account", post(account::open))
        .route("/account/my", get(account::list_mine))
        .route("/account/:id", get(account::get).delete(account::delete))
        .route("/account/:id/status", patch(account::update_status))
        .route("/account/number/:number", get(account::get_by_number))
        .route("/account/user/:user_id", get(account::list_for_user))
        .route("/account/branch/:branch_id", get(account::list_for_branch))
        .route("/transaction/deposit", post(transaction::deposit))
        .route("/transaction/withdraw", post(transaction::withdraw))
        .route("/transaction/transfer", post(transaction::transfer))
        .route("/transaction/recent", get(transaction::recent))
        .route("/transaction/:id", get(transaction::get))
        .route("/transaction/account/:account_id", get(transaction::history))
        .route("/branch", post(branch::create))
        .route("/branch/all", get(branch::list))
        .route("/branch/:id", axum::routing::put(branch::update).delete(branch::delete))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id", get(admin::get_user).delete(admin::delete_user))
        .route("/admin/users/:id/status", patch(admin::update_user_status))
        .route("/admin/users/:id/verify-kyc", post(admin::verify_kyc))
        .route("/admin/managers", post(admin::create_manager))
        .route("/dashboard/admin", get(dashboard::admin))
        .route("/dashboard/manager", get(dashboard::manager))
        .route("/dashboard/customer", get(dashboard::customer))
        .route_layer(middleware::from_fn_with_state(state, mw::require_auth))
}

/// Build the full application router: `/health`, the `/api` surface, Swagger UI
/// and the response-shaping middleware stack.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = public_api().merge(protected_api(state.clone()));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(mw::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    let correlation_id = req
                        .headers()
                        .get(&mw::CORRELATION_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri(),
                        correlation_id = %correlation_id,
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(middleware::from_fn(mw::rewrite_error_status))
        .layer(cors)
        .layer(middleware::from_fn(mw::response_time))
        .layer(middleware::from_fn(mw::correlation_id))
}
