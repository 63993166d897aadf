//! JWT issuance and verification (HS256).

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::enums::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    pub fn branch(&self) -> Result<Option<Uuid>, AuthError> {
        self.branch_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Token settings
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

#[derive(Clone)]
pub struct TokenIssuer {
    cfg: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(cfg: TokenConfig) -> Self {
        let encoding = EncodingKey::from_secret(cfg.secret.as_bytes());
        let decoding = DecodingKey::from_secret(cfg.secret.as_bytes());
        Self { cfg, encoding, decoding }
    }

    pub fn issue(&self, user: &AuthUser) -> Result<(String, DateTime<Utc>), AuthError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &AuthUser, now: DateTime<Utc>) -> Result<(String, DateTime<Utc>), AuthError> {
        let expires_at = now + self.cfg.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            branch_id: user.branch_id.map(|b| b.to_string()),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().unwrap_or(expires_at);
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[self.cfg.issuer.as_str()]);
        validation.set_audience(&[self.cfg.audience.as_str()]);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}
