//! Account management for the signed-in user and administrators.

use std::sync::Arc;

use uuid::Uuid;

use super::crud_service::CrudService;
use crate::domain::entities::{User, UserPatch};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

pub struct UserService<R: UserRepository> {
    crud: CrudService<User, R>,
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            crud: CrudService::new(repository.clone()),
            repository,
        }
    }

    pub fn crud(&self) -> &CrudService<User, R> {
        &self.crud
    }

    /// Updates the caller's own profile. The role can never be changed here.
    pub async fn update_me(&self, user_id: Uuid, mut patch: UserPatch) -> Result<User, AppError> {
        patch.role = None;
        self.crud.update(user_id, patch).await
    }

    /// Deactivates the caller's account.
    pub async fn deactivate(&self, user_id: Uuid) -> Result<(), AppError> {
        self.repository.deactivate(user_id).await
    }
}
