//! User-specific queries used by authentication and account management.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::CrudRepository;
use crate::domain::entities::User;
use crate::error::AppError;

#[async_trait]
pub trait UserRepository: CrudRepository<User> {
    /// Finds an active user by (lower-cased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Finds an active user holding the hashed reset token, if it has not expired.
    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<User>, AppError>;

    /// Stores `(hash, expires)` as the pending reset token, or clears it with `None`.
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(String, DateTime<Utc>)>,
    ) -> Result<(), AppError>;

    /// Replaces the password hash, records the change time and clears any
    /// pending reset token.
    async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, AppError>;

    /// Marks the account inactive. Inactive users disappear from every find.
    async fn deactivate(&self, id: Uuid) -> Result<(), AppError>;
}

#[cfg(test)]
mockall::mock! {
    pub UserRepo {}

    #[async_trait]
    impl CrudRepository<User> for UserRepo {
        async fn find_all(&self, features: &crate::domain::query_features::QueryFeatures) -> Result<Vec<User>, AppError>;
        async fn count(&self, features: &crate::domain::query_features::QueryFeatures) -> Result<i64, AppError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
        async fn find_by_id_populated(&self, id: Uuid) -> Result<Option<User>, AppError>;
        async fn insert(&self, new: crate::domain::entities::NewUser) -> Result<User, AppError>;
        async fn update(&self, id: Uuid, patch: crate::domain::entities::UserPatch) -> Result<Option<User>, AppError>;
        async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError>;
        async fn after_write(&self, doc: &User) -> Result<(), AppError>;
    }

    #[async_trait]
    impl UserRepository for UserRepo {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
        async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<User>, AppError>;
        async fn set_reset_token(&self, id: Uuid, token: Option<(String, DateTime<Utc>)>) -> Result<(), AppError>;
        async fn set_password(&self, id: Uuid, password_hash: &str, changed_at: DateTime<Utc>) -> Result<User, AppError>;
        async fn deactivate(&self, id: Uuid) -> Result<(), AppError>;
    }
}
