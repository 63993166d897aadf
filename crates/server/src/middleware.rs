use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use common::ApiEnvelope;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{ApiError, STATUS_HEADER};
use crate::state::AppState;

pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");
pub const RESPONSE_TIME_HEADER: HeaderName = HeaderName::from_static("x-response-time");
pub const AUTH_COOKIE: &str = "auth_token";

/// Largest error body the rewrite will read back.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Correlation id of the current request, available as an extension.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

/// Echo `X-Correlation-ID` or mint one, on both the request and the response.
pub async fn correlation_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let value = HeaderValue::from_str(&id).unwrap_or_else(|_| HeaderValue::from_static("invalid"));
    req.headers_mut().insert(CORRELATION_HEADER, value.clone());
    req.extensions_mut().insert(CorrelationId(id));

    let mut resp = next.run(req).await;
    resp.headers_mut().insert(CORRELATION_HEADER, value);
    resp
}

pub async fn response_time(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed = format!("{}ms", started.elapsed().as_millis());
    if let Ok(v) = HeaderValue::from_str(&elapsed) {
        resp.headers_mut().insert(RESPONSE_TIME_HEADER, v);
    }
    resp
}

/// Turn any remaining error status (unknown route, extractor rejection,
/// caught panic) into a 200 envelope. Bodies that already are envelopes keep
/// their content.
pub async fn rewrite_error_status(req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return resp;
    }

    let (mut parts, body) = resp.into_parts();
    let bytes = to_bytes(body, MAX_ERROR_BODY).await.unwrap_or_default();
    let body = if ApiEnvelope::<serde_json::Value>::looks_like_envelope(&bytes) {
        Body::from(bytes)
    } else {
        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        let message = if text.is_empty() || status.is_server_error() {
            status.canonical_reason().unwrap_or("Request failed").to_string()
        } else {
            text
        };
        debug!(status = status.as_u16(), %message, "rewriting error response");
        match serde_json::to_vec(&ApiEnvelope::<()>::fail(message)) {
            Ok(json) => Body::from(json),
            Err(_) => Body::empty(),
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.insert(STATUS_HEADER, HeaderValue::from(status.as_u16()));
    parts.status = StatusCode::OK;
    Response::from_parts(parts, body)
}

/// Bearer token from `Authorization`, else the `auth_token` cookie.
fn bearer_token(req: &Request) -> Result<Option<String>, ApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let h = h.to_str().map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(ApiError::unauthorized("Authorization header must use the Bearer scheme")),
        };
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Authenticate the caller and attach the resulting `Actor` to the request.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Ok(Some(t)) => t,
        Ok(None) => {
            warn!(path = %req.uri().path(), "missing Authorization header and auth_token cookie");
            return ApiError::unauthorized("Authentication required").into_response();
        }
        Err(e) => return e.into_response(),
    };
    match state.services.auth.authenticate(&token).await {
        Ok(actor) => {
            tracing::Span::current().record("user_id", tracing::field::display(actor.user_id));
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(e) => {
            warn!(path = %req.uri().path(), error = %e, "token validation failed");
            ApiError::from(e).into_response()
        }
    }
}

/// JSON 404 for unmatched routes; the rewrite layer then keeps it as is.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiEnvelope::<()>::fail("Resource not found")))
}
