//! Typed wrappers over the `/api` routes.

use chrono::{DateTime, Utc};
use common::ApiEnvelope;
use models::enums::{AccountStatus, OtpPurpose, UserStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use service::account::domain::{AccountView, OpenAccountInput, UpdateAccountStatusInput};
use service::auth::domain::{AuthUser, ChangePasswordInput, LoginInput, ResetPasswordInput};
use service::branch::domain::{BranchView, CreateBranchInput};
use service::dashboard::{AdminDashboard, CustomerDashboard, ManagerDashboard};
use service::otp::domain::OtpDispatch;
use service::pagination::Page;
use service::transaction::domain::{DepositInput, TransactionView, TransferInput, WithdrawInput};
use service::user::domain::{RegisterInput, UserView};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::ClientError;

type Reply<T> = Result<ApiEnvelope<T>, ClientError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn page_query(page: u32, per_page: u32) -> Vec<(String, String)> {
    vec![("page".into(), page.to_string()), ("per_page".into(), per_page.to_string())]
}

impl ApiClient {
    /// Log in and keep the returned token for later calls.
    pub async fn login(&self, email: &str, password: &str) -> Reply<Session> {
        let input = LoginInput { email: email.into(), password: password.into() };
        let env: ApiEnvelope<Session> = self.post("/api/auth/login", &input).await?;
        if let Some(s) = &env.data {
            self.set_token(s.token.clone());
        }
        Ok(env)
    }

    pub async fn logout(&self) -> Reply<()> {
        let env = self.post("/api/auth/logout", &json!({})).await?;
        self.clear_token();
        Ok(env)
    }

    pub async fn me(&self) -> Reply<AuthUser> {
        self.get("/api/auth/me", &[]).await
    }

    pub async fn change_password(&self, input: &ChangePasswordInput) -> Reply<()> {
        self.post("/api/auth/change-password", input).await
    }

    pub async fn forgot_password(&self, email: &str) -> Reply<()> {
        self.post("/api/auth/forgot-password", &json!({ "email": email })).await
    }

    pub async fn reset_password(&self, input: &ResetPasswordInput) -> Reply<()> {
        self.post("/api/auth/reset-password", input).await
    }

    pub async fn send_registration_otp(&self, email: &str) -> Reply<OtpDispatch> {
        self.post("/api/registration/send-otp", &json!({ "email": email })).await
    }

    pub async fn verify_registration_otp(&self, email: &str, code: &str) -> Reply<()> {
        self.post("/api/registration/verify-otp", &json!({ "email": email, "code": code })).await
    }

    pub async fn register(&self, input: &RegisterInput) -> Reply<UserView> {
        self.post("/api/registration/register", input).await
    }

    pub async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Reply<OtpDispatch> {
        self.post("/api/otp/send", &json!({ "email": email, "purpose": purpose })).await
    }

    pub async fn verify_otp(&self, email: &str, purpose: OtpPurpose, code: &str) -> Reply<()> {
        self.post("/api/otp/verify", &json!({ "email": email, "purpose": purpose, "code": code })).await
    }

    pub async fn open_account(&self, input: &OpenAccountInput) -> Reply<AccountView> {
        self.post("/api/account", input).await
    }

    pub async fn my_accounts(&self) -> Reply<Vec<AccountView>> {
        self.get("/api/account/my", &[]).await
    }

    pub async fn account(&self, id: Uuid) -> Reply<AccountView> {
        self.get(&format!("/api/account/{id}"), &[]).await
    }

    pub async fn account_by_number(&self, number: &str) -> Reply<AccountView> {
        self.get(&format!("/api/account/number/{number}"), &[]).await
    }

    pub async fn branch_accounts(&self, branch_id: Uuid, page: u32, per_page: u32) -> Reply<Page<AccountView>> {
        self.get(&format!("/api/account/branch/{branch_id}"), &page_query(page, per_page)).await
    }

    pub async fn update_account_status(&self, id: Uuid, status: AccountStatus) -> Reply<AccountView> {
        self.patch(&format!("/api/account/{id}/status"), &UpdateAccountStatusInput { status }).await
    }

    pub async fn deposit(&self, input: &DepositInput) -> Reply<TransactionView> {
        self.post("/api/transaction/deposit", input).await
    }

    pub async fn withdraw(&self, input: &WithdrawInput) -> Reply<TransactionView> {
        self.post("/api/transaction/withdraw", input).await
    }

    pub async fn transfer(&self, input: &TransferInput) -> Reply<TransactionView> {
        self.post("/api/transaction/transfer", input).await
    }

    pub async fn transaction(&self, id: Uuid) -> Reply<TransactionView> {
        self.get(&format!("/api/transaction/{id}"), &[]).await
    }

    pub async fn history(&self, account_id: Uuid, page: u32, per_page: u32) -> Reply<Page<TransactionView>> {
        self.get(&format!("/api/transaction/account/{account_id}"), &page_query(page, per_page)).await
    }

    pub async fn recent_transactions(&self, limit: u64) -> Reply<Vec<TransactionView>> {
        self.get("/api/transaction/recent", &[("limit".into(), limit.to_string())]).await
    }

    pub async fn branches(&self) -> Reply<Vec<BranchView>> {
        self.get("/api/branch", &[]).await
    }

    pub async fn create_branch(&self, input: &CreateBranchInput) -> Reply<BranchView> {
        self.post("/api/branch", input).await
    }

    pub async fn users(&self, page: u32, per_page: u32) -> Reply<Page<UserView>> {
        self.get("/api/admin/users", &page_query(page, per_page)).await
    }

    pub async fn update_user_status(&self, id: Uuid, status: UserStatus) -> Reply<UserView> {
        self.patch(&format!("/api/admin/users/{id}/status"), &json!({ "status": status })).await
    }

    pub async fn admin_dashboard(&self) -> Reply<AdminDashboard> {
        self.get("/api/dashboard/admin", &[]).await
    }

    pub async fn manager_dashboard(&self) -> Reply<ManagerDashboard> {
        self.get("/api/dashboard/manager", &[]).await
    }

    pub async fn customer_dashboard(&self) -> Reply<CustomerDashboard> {
        self.get("/api/dashboard/customer", &[]).await
    }
}
