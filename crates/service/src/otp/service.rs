use std::sync::Arc;

use chrono::{Duration, Utc};
use models::enums::OtpPurpose;
use models::otp_verification;
use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::OtpDispatch;
use super::repository::OtpRepository;
use super::sender::OtpSender;
use crate::errors::ServiceError;
use crate::validation::{normalize_email, ValidationErrors};

#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    pub ttl: Duration,
    pub max_attempts: i32,
}

impl Default for OtpSettings {
    fn default() -> Self { Self { ttl: Duration::minutes(10), max_attempts: 3 } }
}

fn code_error(message: &str) -> ServiceError {
    ValidationErrors::single("code", message).into()
}

pub fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

pub struct OtpService {
    repo: Arc<dyn OtpRepository>,
    sender: Arc<dyn OtpSender>,
    settings: OtpSettings,
}

impl OtpService {
    pub fn new(repo: Arc<dyn OtpRepository>, sender: Arc<dyn OtpSender>, settings: OtpSettings) -> Self {
        Self { repo, sender, settings }
    }

    pub fn settings(&self) -> OtpSettings { self.settings }

    /// Issue a fresh code, retiring any earlier unused one for the same purpose.
    #[instrument(skip(self), fields(purpose = %purpose))]
    pub async fn send(&self, email: &str, purpose: OtpPurpose, user_id: Option<Uuid>) -> Result<OtpDispatch, ServiceError> {
        let email = normalize_email(email);
        let retired = self.repo.invalidate_open(&email, purpose).await?;
        let now = Utc::now();
        let expires_at = now + self.settings.ttl;
        let otp = otp_verification::Model {
            id: Uuid::new_v4(),
            user_id,
            email: email.clone(),
            code: generate_code(),
            purpose: purpose.as_str().to_string(),
            expires_at: expires_at.into(),
            attempt_count: 0,
            is_verified: false,
            is_used: false,
            created_at: now.into(),
        };
        let otp = self.repo.insert(otp).await?;
        self.sender.deliver(&email, purpose, &otp.code, expires_at).await?;
        info!(event = "otp_sent", %email, retired, "otp_sent");
        Ok(OtpDispatch { email, purpose, expires_at })
    }

    /// Check `code` against the newest unused code.
    ///
    /// A wrong guess burns one attempt; once the attempts are spent the code
    /// can no longer be verified and a new one must be requested.
    #[instrument(skip(self, code), fields(purpose = %purpose))]
    pub async fn verify(&self, email: &str, purpose: OtpPurpose, code: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        let otp = self
            .repo
            .latest_open(&email, purpose)
            .await?
            .ok_or_else(|| code_error("no pending code, request a new one"))?;

        if otp.expires_at.with_timezone(&Utc) <= Utc::now() {
            return Err(code_error("code has expired"));
        }
        if otp.is_verified && otp.code == code {
            return Ok(());
        }
        let max = self.settings.max_attempts;
        if otp.attempt_count >= max {
            return Err(code_error("too many attempts, request a new code"));
        }
        if otp.code != code {
            if !self.repo.record_attempt(otp.id, max).await? {
                return Err(code_error("too many attempts, request a new code"));
            }
            warn!(event = "otp_mismatch", %email, "otp_mismatch");
            return Err(code_error("invalid code"));
        }
        // attempts may have been spent by concurrent guesses since the read
        if !self.repo.mark_verified(otp.id, max).await? {
            return Err(code_error("too many attempts, request a new code"));
        }
        info!(event = "otp_verified", %email, "otp_verified");
        Ok(())
    }

    async fn verified(&self, email: &str, purpose: OtpPurpose) -> Result<otp_verification::Model, ServiceError> {
        let otp = self
            .repo
            .latest_open(email, purpose)
            .await?
            .filter(|o| o.is_verified)
            .ok_or_else(|| code_error("email has not been verified"))?;
        if otp.expires_at.with_timezone(&Utc) <= Utc::now() {
            return Err(code_error("code has expired"));
        }
        Ok(otp)
    }

    /// Fail unless the newest code for `email` is verified and unexpired.
    pub async fn ensure_verified(&self, email: &str, purpose: OtpPurpose) -> Result<(), ServiceError> {
        self.verified(&normalize_email(email), purpose).await.map(|_| ())
    }

    /// Spend a verified code so it cannot be reused.
    pub async fn consume(&self, email: &str, purpose: OtpPurpose) -> Result<(), ServiceError> {
        let otp = self.verified(&normalize_email(email), purpose).await?;
        if !self.repo.mark_used(otp.id).await? {
            return Err(code_error("email has not been verified"));
        }
        Ok(())
    }
}
