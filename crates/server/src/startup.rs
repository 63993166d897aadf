use std::{net::SocketAddr, sync::Arc};

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use common::env::ensure_env;
use configs::{AppConfig, CorsConfig};
use migration::{Migrator, MigratorTrait};
use service::auth::service::AuthConfig;
use service::auth::token::TokenConfig;
use service::otp::{LogOtpSender, OtpSettings};
use service::user::service::PASSWORD_ALGORITHM;
use service::{AppServices, Repositories, ServiceSettings};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::middleware::CORRELATION_HEADER;
use crate::routes;
use crate::state::AppState;

/// Translate file/env configuration into service settings.
pub fn service_settings(cfg: &AppConfig) -> ServiceSettings {
    ServiceSettings {
        auth: AuthConfig {
            token: TokenConfig {
                secret: cfg.jwt.key.clone(),
                issuer: cfg.jwt.issuer.clone(),
                audience: cfg.jwt.audience.clone(),
                ttl: chrono::Duration::hours(cfg.jwt.expiry_hours),
            },
            password_algorithm: PASSWORD_ALGORITHM.into(),
        },
        otp: OtpSettings {
            ttl: chrono::Duration::minutes(cfg.otp.ttl_minutes),
            max_attempts: cfg.otp.max_attempts,
        },
    }
}

/// CORS restricted to the configured origins, with credentials for the auth cookie.
pub fn build_cors(cfg: &CorsConfig) -> Result<CorsLayer, StartupError> {
    let origins = cfg
        .allowed_origins
        .iter()
        .map(|o| HeaderValue::from_str(o).map_err(|_| StartupError::InvalidConfig(format!("bad CORS origin: {o}"))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, CORRELATION_HEADER])
        .expose_headers([
            CORRELATION_HEADER,
            HeaderName::from_static("x-response-time"),
            HeaderName::from_static(crate::errors::STATUS_HEADER),
        ])
        .allow_credentials(true))
}

async fn bootstrap_admin(services: &AppServices, cfg: &AppConfig) -> anyhow::Result<()> {
    let admin = &cfg.admin;
    if admin.email.trim().is_empty() || admin.password.is_empty() {
        warn!("admin bootstrap skipped; set admin.email and admin.password to enable it");
        return Ok(());
    }
    let created = services.users.ensure_admin(&admin.email, &admin.password, &admin.full_name).await?;
    info!(email = %admin.email, created, "admin bootstrap");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Connect, migrate, wire services and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    ensure_env(&cfg.logging.dir).await?;

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    Migrator::up(&db, None).await?;
    info!("migrations applied");

    let services = AppServices::build(Repositories::seaorm(db), Arc::new(LogOtpSender), service_settings(&cfg));
    bootstrap_admin(&services, &cfg).await?;

    let state = AppState::new(services);
    let app: Router = routes::build_router(state, build_cors(&cfg.cors)?);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    info!(%addr, "starting http server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("http server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut cfg = AppConfig::default();
        cfg.jwt.expiry_hours = 12;
        cfg.otp.max_attempts = 5;
        let s = service_settings(&cfg);
        assert_eq!(s.auth.token.ttl, chrono::Duration::hours(12));
        assert_eq!(s.otp.max_attempts, 5);
        assert_eq!(s.auth.password_algorithm, "argon2");
    }

    #[test]
    fn rejects_unparseable_origin() {
        let cfg = CorsConfig { allowed_origins: vec!["http://ok.example".into(), "bad\norigin".into()] };
        assert!(build_cors(&cfg).is_err());
    }
}
