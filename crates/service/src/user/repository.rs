use async_trait::async_trait;
use models::enums::UserRole;
use models::user;
use uuid::Uuid;

use super::domain::UserFilter;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Reads never return soft-deleted users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user together with its credentials.
    async fn create(&self, user: user::Model, password_hash: String, password_algorithm: String) -> Result<user::Model, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<user::Model>, ServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError>;
    /// Includes soft-deleted users; emails are never reused.
    async fn email_taken(&self, email: &str) -> Result<bool, ServiceError>;
    /// Newest first, with the total before paging.
    async fn list(&self, filter: &UserFilter, page: Pagination) -> Result<(Vec<user::Model>, u64), ServiceError>;
    async fn update(&self, user: user::Model) -> Result<user::Model, ServiceError>;
    /// Accounts owned by the user that are not closed or deleted.
    async fn count_open_accounts(&self, user_id: Uuid) -> Result<u64, ServiceError>;
    async fn count_by_role(&self, role: UserRole, branch_id: Option<Uuid>) -> Result<u64, ServiceError>;
}
