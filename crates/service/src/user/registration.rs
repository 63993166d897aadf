//! Customer self-registration: email OTP first, then the KYC form.

use std::sync::Arc;

use models::enums::{OtpPurpose, UserRole};
use tracing::{info, instrument, warn};

use super::domain::{RegisterInput, UserView};
use super::repository::UserRepository;
use super::service::{hash, new_user, PASSWORD_ALGORITHM};
use crate::branch::repository::BranchRepository;
use crate::errors::ServiceError;
use crate::otp::domain::{OtpDispatch, VerifyOtpInput};
use crate::otp::OtpService;
use crate::validation::{normalize_email, Validate, ValidationErrors};

pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    branches: Arc<dyn BranchRepository>,
    otp: Arc<OtpService>,
}

impl RegistrationService {
    pub fn new(users: Arc<dyn UserRepository>, branches: Arc<dyn BranchRepository>, otp: Arc<OtpService>) -> Self {
        Self { users, branches, otp }
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), ServiceError> {
        if self.users.email_taken(email).await? {
            return Err(ServiceError::Conflict("email already registered".into()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn send_otp(&self, email: &str) -> Result<OtpDispatch, ServiceError> {
        let mut e = ValidationErrors::new();
        e.check("email", models::user::validate_email(email));
        e.into_result()?;
        let email = normalize_email(email);
        self.ensure_email_free(&email).await?;
        self.otp.send(&email, OtpPurpose::Registration, None).await
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        VerifyOtpInput { email: email.to_string(), purpose: OtpPurpose::Registration, code: code.to_string() }.validate()?;
        self.otp.verify(email, OtpPurpose::Registration, code).await
    }

    /// Create an active customer. The email must have a verified
    /// registration code, which is spent once the user exists.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<UserView, ServiceError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        let branch = self.branches.find(input.branch_id).await?.ok_or_else(|| ServiceError::not_found("branch"))?;
        if !branch.is_active {
            return Err(ServiceError::Conflict("branch is not accepting registrations".into()));
        }
        self.ensure_email_free(&email).await?;
        let password_hash = hash(&input.password)?;
        self.otp.ensure_verified(&email, OtpPurpose::Registration).await?;

        let mut u = new_user(email, input.full_name, input.phone, UserRole::Customer, Some(branch.id), None);
        u.date_of_birth = Some(input.date_of_birth);
        u.address = Some(input.address);
        u.pan_number = Some(input.pan_number);
        u.aadhaar_number = Some(input.aadhaar_number);
        let created = self.users.create(u, password_hash, PASSWORD_ALGORITHM.into()).await?;
        if let Err(e) = self.otp.consume(&created.email, OtpPurpose::Registration).await {
            warn!(event = "otp_consume_failed", user_id = %created.id, error = %e, "otp_consume_failed");
        }
        info!(event = "user_registered", user_id = %created.id, branch_id = %branch.id, "user_registered");
        created.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBank;
    use crate::otp::{OtpSettings, RecordingOtpSender};
    use crate::pagination::Pagination;
    use crate::user::domain::UserFilter;
    use chrono::{NaiveDate, Utc};
    use models::enums::UserStatus;
    use models::user;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    /// Rejects the first insert as a duplicate, like losing a race on the
    /// unique email index.
    struct LoseFirstInsert {
        bank: Arc<InMemoryBank>,
        lost: AtomicBool,
    }

    #[async_trait::async_trait]
    impl UserRepository for LoseFirstInsert {
        async fn create(&self, u: user::Model, password_hash: String, password_algorithm: String) -> Result<user::Model, ServiceError> {
            if !self.lost.swap(true, Ordering::SeqCst) {
                return Err(ServiceError::Conflict("email already exists".into()));
            }
            UserRepository::create(&*self.bank, u, password_hash, password_algorithm).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<user::Model>, ServiceError> {
            UserRepository::find(&*self.bank, id).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
            UserRepository::find_by_email(&*self.bank, email).await
        }

        async fn email_taken(&self, email: &str) -> Result<bool, ServiceError> {
            UserRepository::email_taken(&*self.bank, email).await
        }

        async fn list(&self, filter: &UserFilter, page: Pagination) -> Result<(Vec<user::Model>, u64), ServiceError> {
            UserRepository::list(&*self.bank, filter, page).await
        }

        async fn update(&self, u: user::Model) -> Result<user::Model, ServiceError> {
            UserRepository::update(&*self.bank, u).await
        }

        async fn count_open_accounts(&self, user_id: Uuid) -> Result<u64, ServiceError> {
            UserRepository::count_open_accounts(&*self.bank, user_id).await
        }

        async fn count_by_role(&self, role: UserRole, branch_id: Option<Uuid>) -> Result<u64, ServiceError> {
            UserRepository::count_by_role(&*self.bank, role, branch_id).await
        }
    }

    async fn setup() -> (RegistrationService, Arc<RecordingOtpSender>, Uuid) {
        let bank = Arc::new(InMemoryBank::new());
        let sender = Arc::new(RecordingOtpSender::new());
        let otp = Arc::new(OtpService::new(bank.clone(), sender.clone(), OtpSettings::default()));
        let branch = bank.seed_branch("MUM001", "SIMB0000001").await.id;
        (RegistrationService::new(bank.clone(), bank.clone(), otp), sender, branch)
    }

    fn input(branch_id: Uuid) -> RegisterInput {
        RegisterInput {
            email: "asha@bank.in".into(),
            full_name: "Asha Rao".into(),
            phone: "9876543210".into(),
            password: "Passw0rd!".into(),
            branch_id,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            address: "12 Marine Drive".into(),
            pan_number: "ABCDE1234F".into(),
            aadhaar_number: "234567890123".into(),
        }
    }

    #[tokio::test]
    async fn full_registration() {
        let (svc, sender, branch) = setup().await;
        svc.send_otp("asha@bank.in").await.unwrap();
        let code = sender.last_code("asha@bank.in", OtpPurpose::Registration).await.unwrap();
        svc.verify_otp("asha@bank.in", &code).await.unwrap();

        let user = svc.register(input(branch)).await.unwrap();
        assert_eq!(user.role, UserRole::Customer);
        assert_eq!(user.status, UserStatus::Active);
        assert!(user.email_verified);
        assert_eq!(user.aadhaar_number.as_deref(), Some("XXXXXXXX0123"));

        let again = svc.send_otp("asha@bank.in").await.unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_without_verified_otp_fails() {
        let (svc, _, branch) = setup().await;
        svc.send_otp("asha@bank.in").await.unwrap();
        let err = svc.register(input(branch)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn kyc_fields_are_validated() {
        let (svc, _, branch) = setup().await;
        let mut bad = input(branch);
        bad.pan_number = "1234".into();
        bad.date_of_birth = Utc::now().date_naive();
        match svc.register(bad).await {
            Err(ServiceError::Validation(v)) => {
                assert!(v.fields().contains_key("pan_number"));
                assert!(v.fields().contains_key("date_of_birth"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_branch_rejected() {
        let (svc, _, _) = setup().await;
        assert!(matches!(svc.register(input(Uuid::new_v4())).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_insert_keeps_the_verified_code() {
        let bank = Arc::new(InMemoryBank::new());
        let sender = Arc::new(RecordingOtpSender::new());
        let otp = Arc::new(OtpService::new(bank.clone(), sender.clone(), OtpSettings::default()));
        let branch = bank.seed_branch("MUM001", "SIMB0000001").await.id;
        let users = Arc::new(LoseFirstInsert { bank: bank.clone(), lost: AtomicBool::new(false) });
        let svc = RegistrationService::new(users, bank.clone(), otp.clone());

        svc.send_otp("asha@bank.in").await.unwrap();
        let code = sender.last_code("asha@bank.in", OtpPurpose::Registration).await.unwrap();
        svc.verify_otp("asha@bank.in", &code).await.unwrap();

        assert!(matches!(svc.register(input(branch)).await, Err(ServiceError::Conflict(_))));
        let user = svc.register(input(branch)).await.unwrap();
        assert_eq!(user.email, "asha@bank.in");
        // spent by the successful registration
        assert!(otp.consume("asha@bank.in", OtpPurpose::Registration).await.is_err());
    }
}
