use std::sync::Arc;

use chrono::Utc;
use models::enums::{UserRole, UserStatus};
use models::user;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{CreateManagerInput, UpdateUserStatusInput, UserFilter, UserView};
use super::repository::UserRepository;
use crate::auth::service::hash_password;
use crate::branch::repository::BranchRepository;
use crate::context::Actor;
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::validation::{normalize_email, Validate};

pub const PASSWORD_ALGORITHM: &str = "argon2";

/// Fields shared by every newly created user.
pub(crate) fn new_user(email: String, full_name: String, phone: String, role: UserRole, branch_id: Option<Uuid>, created_by: Option<Uuid>) -> user::Model {
    let now = Utc::now().into();
    user::Model {
        id: Uuid::new_v4(),
        email,
        full_name: full_name.trim().to_string(),
        phone,
        role: role.as_str().to_string(),
        status: UserStatus::Active.as_str().to_string(),
        branch_id,
        date_of_birth: None,
        address: None,
        pan_number: None,
        aadhaar_number: None,
        kyc_verified: false,
        email_verified: true,
        is_deleted: false,
        created_by,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn hash(password: &str) -> Result<String, ServiceError> {
    hash_password(password).map_err(|e| ServiceError::Internal(e.to_string()))
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    branches: Arc<dyn BranchRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, branches: Arc<dyn BranchRepository>) -> Self {
        Self { users, branches }
    }

    async fn load(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        self.users.find(id).await?.ok_or_else(|| ServiceError::not_found("user"))
    }

    fn can_see(actor: &Actor, u: &user::Model) -> bool {
        actor.user_id == u.id || actor.is_admin() || (u.role == UserRole::Customer.as_str() && u.branch_id.is_some_and(|b| actor.manages_branch(b)))
    }

    /// Admins list everyone; managers are pinned to their own branch.
    pub async fn list(&self, actor: &Actor, mut filter: UserFilter, page: Pagination) -> Result<Page<UserView>, ServiceError> {
        actor.require_role(&[UserRole::Admin, UserRole::BranchManager])?;
        if actor.role == UserRole::BranchManager {
            filter.branch_id = actor.branch_id;
            filter.role = Some(UserRole::Customer);
        }
        let (items, total) = self.users.list(&filter, page).await?;
        Page::new(items, total, page).try_map(UserView::try_from)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<UserView, ServiceError> {
        let u = self.load(id).await?;
        if !Self::can_see(actor, &u) {
            return Err(ServiceError::forbidden("not allowed to view this user"));
        }
        u.try_into()
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn update_status(&self, actor: &Actor, id: Uuid, input: UpdateUserStatusInput) -> Result<UserView, ServiceError> {
        actor.require_role(&[UserRole::Admin, UserRole::BranchManager])?;
        if actor.user_id == id {
            return Err(ServiceError::forbidden("cannot change your own status"));
        }
        let mut u = self.load(id).await?;
        if u.role()? == UserRole::Admin || (!actor.is_admin() && !Self::can_see(actor, &u)) {
            return Err(ServiceError::forbidden("not allowed to change this user's status"));
        }
        u.status = input.status.as_str().to_string();
        u.updated_at = Utc::now().into();
        let updated = self.users.update(u).await?;
        info!(event = "user_status_changed", user_id = %id, status = %input.status, "user_status_changed");
        updated.try_into()
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id, email = %input.email))]
    pub async fn create_manager(&self, actor: &Actor, input: CreateManagerInput) -> Result<UserView, ServiceError> {
        actor.require_role(&[UserRole::Admin])?;
        input.validate()?;
        let email = normalize_email(&input.email);
        let branch = self.branches.find(input.branch_id).await?.ok_or_else(|| ServiceError::not_found("branch"))?;
        if !branch.is_active {
            return Err(ServiceError::Conflict("branch is not active".into()));
        }
        if self.users.email_taken(&email).await? {
            return Err(ServiceError::Conflict("email already registered".into()));
        }
        let u = new_user(email, input.full_name, input.phone, UserRole::BranchManager, Some(branch.id), Some(actor.user_id));
        let created = self.users.create(u, hash(&input.password)?, PASSWORD_ALGORITHM.into()).await?;
        info!(event = "manager_created", user_id = %created.id, branch_id = %branch.id, "manager_created");
        created.try_into()
    }

    /// Soft delete; refused while the user still holds open accounts.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        actor.require_role(&[UserRole::Admin])?;
        if actor.user_id == id {
            return Err(ServiceError::forbidden("cannot delete yourself"));
        }
        let mut u = self.load(id).await?;
        let open = self.users.count_open_accounts(id).await?;
        if open > 0 {
            return Err(ServiceError::Conflict(format!("user still holds {} open accounts", open)));
        }
        u.is_deleted = true;
        u.status = UserStatus::Inactive.as_str().to_string();
        u.updated_at = Utc::now().into();
        self.users.update(u).await?;
        info!(event = "user_deleted", user_id = %id, "user_deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn verify_kyc(&self, actor: &Actor, id: Uuid) -> Result<UserView, ServiceError> {
        actor.require_role(&[UserRole::Admin, UserRole::BranchManager])?;
        let mut u = self.load(id).await?;
        if actor.user_id == id || !Self::can_see(actor, &u) {
            return Err(ServiceError::forbidden("not allowed to verify this user"));
        }
        if u.pan_number.is_none() || u.aadhaar_number.is_none() {
            return Err(ServiceError::Conflict("KYC documents missing".into()));
        }
        u.kyc_verified = true;
        u.updated_at = Utc::now().into();
        let updated = self.users.update(u).await?;
        info!(event = "kyc_verified", user_id = %id, "kyc_verified");
        updated.try_into()
    }

    /// Create the bootstrap admin if no user owns `email` yet.
    ///
    /// Returns whether a user was created.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, email: &str, password: &str, full_name: &str) -> Result<bool, ServiceError> {
        let email = normalize_email(email);
        if self.users.email_taken(&email).await? {
            return Ok(false);
        }
        let u = new_user(email, full_name.to_string(), String::new(), UserRole::Admin, None, None);
        let created = self.users.create(u, hash(password)?, PASSWORD_ALGORITHM.into()).await?;
        info!(event = "admin_bootstrapped", user_id = %created.id, "admin_bootstrapped");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBank;
    use models::enums::AccountType;
    use rust_decimal_macros::dec;

    struct Fixture {
        bank: Arc<InMemoryBank>,
        svc: UserService,
        admin: Actor,
        branch: Uuid,
    }

    async fn fixture() -> Fixture {
        let bank = Arc::new(InMemoryBank::new());
        let branch = bank.seed_branch("MUM001", "SIMB0000001").await.id;
        let admin = bank.seed_user("root@bank.in", "Root", UserRole::Admin, None, "Adm1nPass").await;
        let svc = UserService::new(bank.clone(), bank.clone());
        Fixture { svc, admin: Actor::new(admin.id, UserRole::Admin, None), bank, branch }
    }

    fn manager_input(branch: Uuid) -> CreateManagerInput {
        CreateManagerInput {
            email: "Meera@Bank.in".into(),
            full_name: "Meera Iyer".into(),
            phone: "9876500000".into(),
            password: "Manag3rPass".into(),
            branch_id: branch,
        }
    }

    #[tokio::test]
    async fn admin_creates_manager() {
        let f = fixture().await;
        let m = f.svc.create_manager(&f.admin, manager_input(f.branch)).await.unwrap();
        assert_eq!(m.email, "meera@bank.in");
        assert_eq!(m.role, UserRole::BranchManager);
        assert_eq!(m.branch_id, Some(f.branch));
        let dup = f.svc.create_manager(&f.admin, manager_input(f.branch)).await.unwrap_err();
        assert!(matches!(dup, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn manager_sees_only_own_branch_customers() {
        let f = fixture().await;
        let other = f.bank.seed_branch("PUN001", "SIMB0000002").await.id;
        f.bank.seed_user("a@bank.in", "A", UserRole::Customer, Some(f.branch), "Passw0rd!").await;
        let outsider = f.bank.seed_user("b@bank.in", "B", UserRole::Customer, Some(other), "Passw0rd!").await;
        let m = f.svc.create_manager(&f.admin, manager_input(f.branch)).await.unwrap();
        let manager = Actor::new(m.id, UserRole::BranchManager, Some(f.branch));

        let page = f.svc.list(&manager, UserFilter::default(), Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].email, "a@bank.in");
        assert!(f.svc.get(&manager, outsider.id).await.is_err());

        let all = f.svc.list(&f.admin, UserFilter::default(), Pagination::default()).await.unwrap();
        assert_eq!(all.total, 4);
    }

    #[tokio::test]
    async fn customers_cannot_list() {
        let f = fixture().await;
        let c = f.bank.seed_user("a@bank.in", "A", UserRole::Customer, Some(f.branch), "Passw0rd!").await;
        let actor = Actor::new(c.id, UserRole::Customer, Some(f.branch));
        assert!(matches!(f.svc.list(&actor, UserFilter::default(), Pagination::default()).await, Err(ServiceError::Forbidden(_))));
        assert_eq!(f.svc.get(&actor, c.id).await.unwrap().id, c.id);
    }

    #[tokio::test]
    async fn status_changes() {
        let f = fixture().await;
        let c = f.bank.seed_user("a@bank.in", "A", UserRole::Customer, Some(f.branch), "Passw0rd!").await;
        let v = f.svc.update_status(&f.admin, c.id, UpdateUserStatusInput { status: UserStatus::Suspended }).await.unwrap();
        assert_eq!(v.status, UserStatus::Suspended);
        assert!(f.svc.update_status(&f.admin, f.admin.user_id, UpdateUserStatusInput { status: UserStatus::Inactive }).await.is_err());
    }

    #[tokio::test]
    async fn delete_refused_with_open_accounts() {
        let f = fixture().await;
        let c = f.bank.seed_user("a@bank.in", "A", UserRole::Customer, Some(f.branch), "Passw0rd!").await;
        let acc = f.bank.seed_account(c.id, f.branch, AccountType::Salary, dec!(0)).await;
        assert!(matches!(f.svc.delete(&f.admin, c.id).await, Err(ServiceError::Conflict(_))));

        f.bank.close_account(acc.id).await;
        f.svc.delete(&f.admin, c.id).await.unwrap();
        assert!(matches!(f.svc.get(&f.admin, c.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let f = fixture().await;
        assert!(f.svc.ensure_admin("boss@bank.in", "B0ssPassword", "Boss").await.unwrap());
        assert!(!f.svc.ensure_admin("BOSS@bank.in", "B0ssPassword", "Boss").await.unwrap());
    }
}
