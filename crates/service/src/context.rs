use models::enums::UserRole;
use uuid::Uuid;

use crate::errors::ServiceError;

/// The authenticated caller on whose behalf a service runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
    pub branch_id: Option<Uuid>,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole, branch_id: Option<Uuid>) -> Self {
        Self { user_id, role, branch_id }
    }

    pub fn is_admin(&self) -> bool { self.role == UserRole::Admin }

    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), ServiceError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!("role {} may not perform this action", self.role)))
        }
    }

    /// Admins see every branch; managers only their own.
    pub fn manages_branch(&self, branch_id: Uuid) -> bool {
        match self.role {
            UserRole::Admin => true,
            UserRole::BranchManager => self.branch_id == Some(branch_id),
            UserRole::Customer => false,
        }
    }

    /// Read access to something owned by `owner_id` in `branch_id`.
    pub fn can_view(&self, owner_id: Uuid, branch_id: Uuid) -> bool {
        self.user_id == owner_id || self.manages_branch(branch_id)
    }
}
