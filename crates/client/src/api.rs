use std::sync::Arc;
use std::time::Duration;

use common::ApiEnvelope;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ClientError;
use crate::listener::ErrorListener;
use crate::pending::{request_key, PendingRequests};
use crate::token::{MemoryTokenStore, TokenStore};

const STATUS_HEADER: &str = "x-status-code";
const TIMEOUT_SECS: u64 = 30;

enum Outcome {
    Response { logical: u16, body: Vec<u8> },
    Transport(String),
}

/// Message shown when the server did not send an envelope.
fn fallback_message(status: u16) -> &'static str {
    match status {
        400 => "The request was invalid",
        401 => "Session expired, please log in again",
        403 => "You do not have permission to perform this action",
        404 => "Resource not found",
        500..=599 => "Server error, please try again later",
        _ => "Unexpected response from server",
    }
}

async fn execute(rb: reqwest::RequestBuilder) -> Outcome {
    let resp = match rb.send().await {
        Ok(r) => r,
        Err(e) => return Outcome::Transport(e.to_string()),
    };
    let status = resp.status().as_u16();
    let logical = resp
        .headers()
        .get(STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(status);
    match resp.bytes().await {
        Ok(b) => Outcome::Response { logical, body: b.to_vec() },
        Err(e) => Outcome::Transport(e.to_string()),
    }
}

/// HTTP client for the bank API.
///
/// Every call resolves to an envelope; network and HTTP failures become
/// `success: false` envelopes and are reported to the [`ErrorListener`].
/// A 401 clears the stored token. Only cancellation by a newer identical
/// request surfaces as `Err`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    listener: Option<Arc<dyn ErrorListener>>,
    pending: Arc<PendingRequests>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("bank-sim-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: Arc::new(MemoryTokenStore::new()),
            listener: None,
            pending: Arc::new(PendingRequests::new()),
        })
    }

    pub fn with_listener(mut self, listener: Arc<dyn ErrorListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn token(&self) -> Option<String> { self.tokens.get() }

    pub fn set_token(&self, token: impl Into<String>) { self.tokens.set(token.into()) }

    pub(crate) fn clear_token(&self) { self.tokens.clear() }

    /// Requests currently in flight.
    pub fn in_flight(&self) -> usize { self.pending.len() }

    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<ApiEnvelope<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let body = match body.map(serde_json::to_string).transpose() {
            Ok(b) => b,
            Err(e) => return Ok(self.settle(Outcome::Transport(format!("cannot encode request: {e}")))),
        };
        let key = request_key(method.as_str(), &url, query, body.as_deref());

        let mut rb = self.http.request(method, &url);
        if !query.is_empty() {
            rb = rb.query(query);
        }
        if let Some(token) = self.tokens.get() {
            rb = rb.bearer_auth(token);
        }
        if let Some(json) = body {
            rb = rb.header(CONTENT_TYPE, "application/json").body(json);
        }

        let task = tokio::spawn(execute(rb));
        let tracked = self.pending.track(&key, task.abort_handle());
        let joined = task.await;
        drop(tracked);

        let outcome = match joined {
            Ok(o) => o,
            Err(e) if e.is_cancelled() => {
                debug!(%key, "request cancelled");
                return Err(ClientError::Cancelled);
            }
            Err(e) => Outcome::Transport(e.to_string()),
        };
        Ok(self.settle(outcome))
    }

    fn settle<T: DeserializeOwned>(&self, outcome: Outcome) -> ApiEnvelope<T> {
        let (status, envelope) = match outcome {
            Outcome::Transport(msg) => (0, ApiEnvelope::fail(format!("Network error: {msg}"))),
            Outcome::Response { logical, body } => {
                let env = serde_json::from_slice::<ApiEnvelope<T>>(&body)
                    .unwrap_or_else(|_| ApiEnvelope::fail(fallback_message(logical)));
                (logical, env)
            }
        };
        if status == 401 {
            self.tokens.clear();
            if let Some(l) = &self.listener {
                l.on_session_expired();
            }
        }
        if !envelope.success {
            if let Some(l) = &self.listener {
                l.on_error(&envelope.message, status);
            }
        }
        envelope
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<ApiEnvelope<T>, ClientError> {
        self.request::<(), T>(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<ApiEnvelope<T>, ClientError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<ApiEnvelope<T>, ClientError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<ApiEnvelope<T>, ClientError> {
        self.request(Method::PATCH, path, &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>, ClientError> {
        self.request::<(), T>(Method::DELETE, path, &[], None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(c.base_url, "http://localhost:8080");
    }

    #[test]
    fn non_envelope_bodies_get_friendly_messages() {
        let c = ApiClient::new("http://localhost:8080").unwrap();
        c.set_token("t");
        let env: ApiEnvelope<()> = c.settle(Outcome::Response { logical: 401, body: b"Unauthorized".to_vec() });
        assert!(!env.success);
        assert_eq!(env.message, "Session expired, please log in again");
        assert_eq!(c.token(), None);

        let env: ApiEnvelope<()> = c.settle(Outcome::Transport("connection refused".into()));
        assert_eq!(env.message, "Network error: connection refused");
    }
}
