use std::sync::Arc;

use chrono::Utc;
use models::branch;
use models::enums::UserRole;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{BranchView, CreateBranchInput, UpdateBranchInput};
use super::repository::BranchRepository;
use crate::context::Actor;
use crate::errors::ServiceError;
use crate::validation::Validate;

pub struct BranchService {
    repo: Arc<dyn BranchRepository>,
}

impl BranchService {
    pub fn new(repo: Arc<dyn BranchRepository>) -> Self { Self { repo } }

    #[instrument(skip(self, input), fields(code = %input.code, actor = %actor.user_id))]
    pub async fn create(&self, actor: &Actor, input: CreateBranchInput) -> Result<BranchView, ServiceError> {
        actor.require_role(&[UserRole::Admin])?;
        input.validate()?;
        if self.repo.code_or_ifsc_taken(&input.code, &input.ifsc).await? {
            return Err(ServiceError::Conflict("branch code or IFSC already exists".into()));
        }
        let now = Utc::now().into();
        let created = self
            .repo
            .insert(branch::Model {
                id: Uuid::new_v4(),
                code: input.code,
                name: input.name.trim().to_string(),
                ifsc: input.ifsc,
                branch_type: input.branch_type.as_str().to_string(),
                address: input.address,
                city: input.city,
                state: input.state,
                phone: input.phone,
                is_active: true,
                is_deleted: false,
                created_by: Some(actor.user_id),
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(event = "branch_created", branch_id = %created.id, "branch_created");
        created.try_into()
    }

    pub async fn get(&self, id: Uuid) -> Result<BranchView, ServiceError> {
        self.repo.find(id).await?.ok_or_else(|| ServiceError::not_found("branch"))?.try_into()
    }

    /// Active branches for everyone; admins may include inactive ones.
    pub async fn list(&self, actor: Option<&Actor>, include_inactive: bool) -> Result<Vec<BranchView>, ServiceError> {
        let include_inactive = include_inactive && actor.is_some_and(Actor::is_admin);
        self.repo.list(include_inactive).await?.into_iter().map(BranchView::try_from).collect()
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id))]
    pub async fn update(&self, actor: &Actor, id: Uuid, input: UpdateBranchInput) -> Result<BranchView, ServiceError> {
        actor.require_role(&[UserRole::Admin, UserRole::BranchManager])?;
        if !actor.manages_branch(id) {
            return Err(ServiceError::forbidden("branch belongs to another manager"));
        }
        if input.is_active.is_some() && !actor.is_admin() {
            return Err(ServiceError::forbidden("only admins may activate or deactivate branches"));
        }
        input.validate()?;
        let mut b = self.repo.find(id).await?.ok_or_else(|| ServiceError::not_found("branch"))?;
        if let Some(v) = input.name { b.name = v.trim().to_string(); }
        if let Some(v) = input.branch_type { b.branch_type = v.as_str().to_string(); }
        if let Some(v) = input.address { b.address = v; }
        if let Some(v) = input.city { b.city = v; }
        if let Some(v) = input.state { b.state = v; }
        if let Some(v) = input.phone { b.phone = v; }
        if let Some(v) = input.is_active { b.is_active = v; }
        b.updated_at = Utc::now().into();
        let updated = self.repo.update(b).await?;
        info!(event = "branch_updated", branch_id = %id, "branch_updated");
        updated.try_into()
    }

    /// Soft delete; refused while the branch still has open accounts.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        actor.require_role(&[UserRole::Admin])?;
        let mut b = self.repo.find(id).await?.ok_or_else(|| ServiceError::not_found("branch"))?;
        let open = self.repo.count_open_accounts(id).await?;
        if open > 0 {
            return Err(ServiceError::Conflict(format!("branch still has {} open accounts", open)));
        }
        b.is_deleted = true;
        b.is_active = false;
        b.updated_at = Utc::now().into();
        self.repo.update(b).await?;
        info!(event = "branch_deleted", branch_id = %id, "branch_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBank;
    use models::enums::{AccountType, BranchType};
    use rust_decimal_macros::dec;

    fn input(code: &str, ifsc: &str) -> CreateBranchInput {
        CreateBranchInput {
            code: code.into(),
            name: "Fort Mumbai".into(),
            ifsc: ifsc.into(),
            branch_type: BranchType::Urban,
            address: "1 Hornby Road".into(),
            city: "Mumbai".into(),
            state: "Maharashtra".into(),
            phone: "9876543210".into(),
        }
    }

    fn admin() -> Actor { Actor::new(Uuid::new_v4(), UserRole::Admin, None) }

    #[tokio::test]
    async fn create_and_list() {
        let svc = BranchService::new(Arc::new(InMemoryBank::new()));
        let b = svc.create(&admin(), input("MUM001", "SIMB0000001")).await.unwrap();
        assert_eq!(b.code, "MUM001");
        assert!(b.is_active);
        assert_eq!(svc.list(None, false).await.unwrap().len(), 1);
        assert_eq!(svc.get(b.id).await.unwrap(), b);
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let svc = BranchService::new(Arc::new(InMemoryBank::new()));
        svc.create(&admin(), input("MUM001", "SIMB0000001")).await.unwrap();
        let err = svc.create(&admin(), input("MUM001", "SIMB0000002")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_admins_create() {
        let svc = BranchService::new(Arc::new(InMemoryBank::new()));
        let customer = Actor::new(Uuid::new_v4(), UserRole::Customer, None);
        assert!(matches!(svc.create(&customer, input("MUM001", "SIMB0000001")).await, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn invalid_fields_are_collected() {
        let svc = BranchService::new(Arc::new(InMemoryBank::new()));
        let mut bad = input("m1", "BAD");
        bad.phone = "123".into();
        match svc.create(&admin(), bad).await {
            Err(ServiceError::Validation(v)) => {
                let f = v.fields();
                assert!(f.contains_key("code"));
                assert!(f.contains_key("ifsc"));
                assert!(f.contains_key("phone"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn manager_updates_own_branch_only() {
        let bank = Arc::new(InMemoryBank::new());
        let svc = BranchService::new(bank.clone());
        let own = svc.create(&admin(), input("MUM001", "SIMB0000001")).await.unwrap();
        let other = svc.create(&admin(), input("PUN001", "SIMB0000002")).await.unwrap();
        let manager = Actor::new(Uuid::new_v4(), UserRole::BranchManager, Some(own.id));

        let patch = UpdateBranchInput { name: Some("Fort".into()), ..Default::default() };
        assert_eq!(svc.update(&manager, own.id, patch.clone()).await.unwrap().name, "Fort");
        assert!(svc.update(&manager, other.id, patch).await.is_err());
        let deactivate = UpdateBranchInput { is_active: Some(false), ..Default::default() };
        assert!(svc.update(&manager, own.id, deactivate).await.is_err());
    }

    #[tokio::test]
    async fn delete_refused_with_open_accounts() {
        let bank = Arc::new(InMemoryBank::new());
        let svc = BranchService::new(bank.clone());
        let b = svc.create(&admin(), input("MUM001", "SIMB0000001")).await.unwrap();
        let user = bank.seed_user("c@bank.in", "C", UserRole::Customer, Some(b.id), "Passw0rd!").await;
        bank.seed_account(user.id, b.id, AccountType::Savings, dec!(5000)).await;

        assert!(matches!(svc.delete(&admin(), b.id).await, Err(ServiceError::Conflict(_))));

        let empty = svc.create(&admin(), input("PUN001", "SIMB0000002")).await.unwrap();
        svc.delete(&admin(), empty.id).await.unwrap();
        assert!(matches!(svc.get(empty.id).await, Err(ServiceError::NotFound(_))));
    }
}
