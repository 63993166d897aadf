use async_trait::async_trait;
use chrono::{DateTime, Utc};
use models::enums::OtpPurpose;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::ServiceError;

/// Delivery channel for one-time codes (email, SMS, ...).
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn deliver(&self, email: &str, purpose: OtpPurpose, code: &str, expires_at: DateTime<Utc>) -> Result<(), ServiceError>;
}

/// Writes codes to the log. The simulation has no mail gateway.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn deliver(&self, email: &str, purpose: OtpPurpose, code: &str, expires_at: DateTime<Utc>) -> Result<(), ServiceError> {
        info!(event = "otp_delivered", %email, %purpose, %code, %expires_at, "otp_delivered");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentOtp {
    pub email: String,
    pub purpose: OtpPurpose,
    pub code: String,
}

/// Keeps every delivered code in memory.
#[derive(Debug, Default)]
pub struct RecordingOtpSender {
    sent: Mutex<Vec<SentOtp>>,
}

impl RecordingOtpSender {
    pub fn new() -> Self { Self::default() }

    pub async fn last_code(&self, email: &str, purpose: OtpPurpose) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|s| s.email == email && s.purpose == purpose)
            .map(|s| s.code.clone())
    }

    pub async fn count(&self) -> usize { self.sent.lock().await.len() }
}

#[async_trait]
impl OtpSender for RecordingOtpSender {
    async fn deliver(&self, email: &str, purpose: OtpPurpose, code: &str, _expires_at: DateTime<Utc>) -> Result<(), ServiceError> {
        self.sent.lock().await.push(SentOtp { email: email.to_string(), purpose, code: code.to_string() });
        Ok(())
    }
}
