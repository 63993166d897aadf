#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use service::memory::InMemoryBank;
use service::otp::RecordingOtpSender;
use service::{AppServices, Repositories};
use tower::ServiceExt;

use server::routes;
use server::state::AppState;

pub const PASSWORD: &str = "Passw0rd!";

pub struct TestApp {
    pub app: Router,
    pub bank: Arc<InMemoryBank>,
    pub sender: Arc<RecordingOtpSender>,
    pub services: AppServices,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    /// Status carried in `X-Status-Code`, or the transport status.
    pub fn logical_status(&self) -> u16 {
        self.headers
            .get("x-status-code")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.status.as_u16())
    }

    pub fn success(&self) -> bool {
        self.body["success"].as_bool().unwrap_or(false)
    }
}

pub fn test_app() -> TestApp {
    let mut cfg = configs::AppConfig::default();
    cfg.jwt.key = "test-secret-test-secret-test-secret!".into();
    let bank = Arc::new(InMemoryBank::new());
    let sender = Arc::new(RecordingOtpSender::new());
    let services = AppServices::build(
        Repositories::in_memory(bank.clone()),
        sender.clone(),
        server::startup::service_settings(&cfg),
    );
    let cors = server::startup::build_cors(&cfg.cors).unwrap();
    let app = routes::build_router(AppState::new(services.clone()), cors);
    TestApp { app, bank, sender, services }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        Reply { status, headers, body }
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut b = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            b = b.header("authorization", format!("Bearer {t}"));
        }
        let req = match body {
            Some(json) => b
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => b.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let reply = self
            .request("POST", "/api/auth/login", None, Some(serde_json::json!({"email": email, "password": password})))
            .await;
        assert!(reply.success(), "login failed: {}", reply.body);
        reply.body["data"]["token"].as_str().unwrap().to_string()
    }
}
