use chrono::NaiveDate;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Every `/api` response. Failures keep HTTP 200 and set `X-Status-Code`.
#[derive(ToSchema)]
pub struct EnvelopeDoc {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<String>,
    /// Field name to messages, present on validation failures.
    #[schema(value_type = Option<Object>)]
    pub errors: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ChangePasswordRequest { pub current_password: String, pub new_password: String }

#[derive(ToSchema)]
pub struct ForgotPasswordRequest { pub email: String }

#[derive(ToSchema)]
pub struct ResetPasswordRequest { pub email: String, pub code: String, pub new_password: String }

#[derive(ToSchema)]
pub struct EmailRequest { pub email: String }

#[derive(ToSchema)]
pub struct EmailCodeRequest { pub email: String, pub code: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub password: String,
    pub branch_id: Uuid,
    pub date_of_birth: NaiveDate,
    pub address: String,
    #[schema(example = "ABCDE1234F")]
    pub pan_number: String,
    #[schema(example = "123456789012")]
    pub aadhaar_number: String,
}

#[derive(ToSchema)]
pub struct SendOtpRequest {
    pub email: String,
    #[schema(example = "Registration")]
    pub purpose: String,
}

#[derive(ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    #[schema(example = "Registration")]
    pub purpose: String,
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(ToSchema)]
pub struct OpenAccountRequest {
    pub user_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    #[schema(example = "Savings")]
    pub account_type: String,
    #[schema(example = 1000.0)]
    pub initial_deposit: f64,
}

#[derive(ToSchema)]
pub struct AccountStatusRequest {
    #[schema(example = "Frozen")]
    pub status: String,
}

#[derive(ToSchema)]
pub struct DepositRequest { pub account_id: Uuid, pub amount: f64, pub description: Option<String> }

#[derive(ToSchema)]
pub struct WithdrawRequest { pub account_id: Uuid, pub amount: f64, pub description: Option<String> }

#[derive(ToSchema)]
pub struct TransferRequest {
    pub from_account_id: Uuid,
    pub to_account_id: Option<Uuid>,
    pub to_account_number: Option<String>,
    #[schema(example = 2500.0)]
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateBranchRequest {
    #[schema(example = "MUM01")]
    pub code: String,
    pub name: String,
    #[schema(example = "BANK0MUM001")]
    pub ifsc: String,
    #[schema(example = "Urban")]
    pub branch_type: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
}

#[derive(ToSchema)]
pub struct UpdateBranchRequest {
    pub name: Option<String>,
    pub branch_type: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(ToSchema)]
pub struct UserStatusRequest {
    #[schema(example = "Suspended")]
    pub status: String,
}

#[derive(ToSchema)]
pub struct CreateManagerRequest {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub password: String,
    pub branch_id: Uuid,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::change_password,
        crate::routes::auth::forgot_password,
        crate::routes::auth::reset_password,
        crate::routes::registration::send_otp,
        crate::routes::registration::verify_otp,
        crate::routes::registration::register,
        crate::routes::otp::send,
        crate::routes::otp::verify,
        crate::routes::account::open,
        crate::routes::account::list_mine,
        crate::routes::account::get,
        crate::routes::account::get_by_number,
        crate::routes::account::list_for_user,
        crate::routes::account::list_for_branch,
        crate::routes::account::update_status,
        crate::routes::account::delete,
        crate::routes::transaction::deposit,
        crate::routes::transaction::withdraw,
        crate::routes::transaction::transfer,
        crate::routes::transaction::recent,
        crate::routes::transaction::get,
        crate::routes::transaction::history,
        crate::routes::branch::list_public,
        crate::routes::branch::list,
        crate::routes::branch::get,
        crate::routes::branch::create,
        crate::routes::branch::update,
        crate::routes::branch::delete,
        crate::routes::admin::list_users,
        crate::routes::admin::get_user,
        crate::routes::admin::update_user_status,
        crate::routes::admin::verify_kyc,
        crate::routes::admin::delete_user,
        crate::routes::admin::create_manager,
        crate::routes::dashboard::admin,
        crate::routes::dashboard::manager,
        crate::routes::dashboard::customer,
    ),
    components(
        schemas(
            HealthResponse,
            EnvelopeDoc,
            LoginRequest,
            ChangePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            EmailRequest,
            EmailCodeRequest,
            RegisterRequest,
            SendOtpRequest,
            VerifyOtpRequest,
            OpenAccountRequest,
            AccountStatusRequest,
            DepositRequest,
            WithdrawRequest,
            TransferRequest,
            CreateBranchRequest,
            UpdateBranchRequest,
            UserStatusRequest,
            CreateManagerRequest,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "registration"),
        (name = "otp"),
        (name = "account"),
        (name = "transaction"),
        (name = "branch"),
        (name = "admin"),
        (name = "dashboard")
    )
)]
pub struct ApiDoc;
