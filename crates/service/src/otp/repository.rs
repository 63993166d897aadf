use async_trait::async_trait;
use models::enums::OtpPurpose;
use models::otp_verification;
use uuid::Uuid;

use crate::errors::ServiceError;

/// State changes are conditional updates so that concurrent verifications
/// of the same code cannot step over each other.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Mark every unused code for `email` + `purpose` as used.
    async fn invalidate_open(&self, email: &str, purpose: OtpPurpose) -> Result<u64, ServiceError>;
    async fn insert(&self, otp: otp_verification::Model) -> Result<otp_verification::Model, ServiceError>;
    /// Newest unused code.
    async fn latest_open(&self, email: &str, purpose: OtpPurpose) -> Result<Option<otp_verification::Model>, ServiceError>;
    /// Burn one attempt. `false` when `max_attempts` were already spent.
    async fn record_attempt(&self, id: Uuid, max_attempts: i32) -> Result<bool, ServiceError>;
    /// `false` when the attempts are spent or the code was used meanwhile.
    async fn mark_verified(&self, id: Uuid, max_attempts: i32) -> Result<bool, ServiceError>;
    /// Spend a verified code. `false` when it was not verified or already used.
    async fn mark_used(&self, id: Uuid) -> Result<bool, ServiceError>;
}
