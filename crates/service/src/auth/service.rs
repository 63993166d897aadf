use std::sync::Arc;

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use models::enums::{OtpPurpose, UserStatus};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, ChangePasswordInput, ForgotPasswordInput, LoginInput, ResetPasswordInput};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::{Claims, TokenConfig, TokenIssuer};
use crate::context::Actor;
use crate::otp::OtpService;
use crate::validation::{normalize_email, Validate};

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub token: TokenConfig,
    pub password_algorithm: String,
}

/// Hash a password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Auth business service independent of web framework
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    otp: Option<Arc<OtpService>>,
    tokens: TokenIssuer,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, otp: Option<Arc<OtpService>>, cfg: AuthConfig) -> Self {
        let tokens = TokenIssuer::new(cfg.token.clone());
        Self { repo, otp, tokens, cfg }
    }

    pub fn password_algorithm(&self) -> &str { &self.cfg.password_algorithm }

    /// Authenticate and issue a bearer token.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        let user = self.repo.find_user_by_email(&email).await?.ok_or(AuthError::Unauthorized)?;
        let cred = self.repo.get_credentials(user.id).await?.ok_or(AuthError::Unauthorized)?;

        if !verify_password(&input.password, &cred.password_hash)? {
            warn!(event = "login_failed", user_id = %user.id, "login_failed");
            return Err(AuthError::Unauthorized);
        }
        if user.status != UserStatus::Active {
            debug!(status = %user.status, "login refused for non-active user");
            return Err(AuthError::Inactive);
        }

        let (token, expires_at) = self.tokens.issue(&user)?;
        info!(event = "login", user_id = %user.id, role = %user.role, "user_logged_in");
        Ok(AuthSession { user, token, expires_at })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token)
    }

    /// Resolve a bearer token to the caller it was issued to.
    ///
    /// The user is re-read so deactivated or deleted users lose access before
    /// their token expires.
    pub async fn authenticate(&self, token: &str) -> Result<Actor, AuthError> {
        let claims = self.verify_token(token)?;
        let user = self.repo.find_user(claims.user_id()?).await?.ok_or(AuthError::Unauthorized)?;
        if user.status != UserStatus::Active {
            return Err(AuthError::Inactive);
        }
        Ok(Actor::new(user.id, user.role, user.branch_id))
    }

    pub async fn me(&self, user_id: Uuid) -> Result<AuthUser, AuthError> {
        self.repo.find_user(user_id).await?.ok_or(AuthError::NotFound)
    }

    #[instrument(skip(self, input))]
    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> Result<(), AuthError> {
        input.validate()?;
        let cred = self.repo.get_credentials(user_id).await?.ok_or(AuthError::NotFound)?;
        if !verify_password(&input.current_password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }
        let hash = hash_password(&input.new_password)?;
        self.repo.upsert_password(user_id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(event = "password_changed", %user_id, "password_changed");
        Ok(())
    }

    /// Send a reset code. Unknown emails succeed silently.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<(), AuthError> {
        let email = normalize_email(&input.email);
        let otp = self.otp.as_ref().ok_or_else(|| AuthError::Repository("otp service not configured".into()))?;
        match self.repo.find_user_by_email(&email).await? {
            Some(user) => {
                otp.send(&email, OtpPurpose::PasswordReset, Some(user.id)).await?;
            }
            None => debug!("password reset requested for unknown email"),
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), AuthError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        let otp = self.otp.as_ref().ok_or_else(|| AuthError::Repository("otp service not configured".into()))?;
        let user = self.repo.find_user_by_email(&email).await?.ok_or(AuthError::NotFound)?;
        otp.verify(&email, OtpPurpose::PasswordReset, &input.code).await?;
        let hash = hash_password(&input.new_password)?;
        otp.consume(&email, OtpPurpose::PasswordReset).await?;
        self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(event = "password_reset", user_id = %user.id, "password_reset");
        Ok(())
    }
}
