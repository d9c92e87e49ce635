//! Generic persistence contract shared by every document type.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::query_features::QueryFeatures;
use crate::error::AppError;

/// CRUD operations backing the generic handler factory.
///
/// Every find-style operation applies the document's visibility rules
/// (secret tours and deactivated users are never returned, updated or deleted).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTourRepository`]
/// - [`crate::infrastructure::persistence::PgUserRepository`]
/// - [`crate::infrastructure::persistence::PgReviewRepository`]
#[async_trait]
pub trait CrudRepository<D: Document>: Send + Sync {
    /// Lists documents matching the filters, sorted and paginated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when a filter value cannot be cast to
    /// its field type.
    async fn find_all(&self, features: &QueryFeatures) -> Result<Vec<D>, AppError>;

    /// Counts documents matching the filters, ignoring pagination.
    async fn count(&self, features: &QueryFeatures) -> Result<i64, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<D>, AppError>;

    /// Like [`Self::find_by_id`], with reverse relations resolved.
    async fn find_by_id_populated(&self, id: Uuid) -> Result<Option<D>, AppError> {
        self.find_by_id(id).await
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on unique or check constraint violations.
    async fn insert(&self, new: D::Create) -> Result<D, AppError>;

    /// Applies a partial update. Returns `None` if no visible document has `id`.
    async fn update(&self, id: Uuid, patch: D::Patch) -> Result<Option<D>, AppError>;

    /// Deletes a document and returns it, or `None` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<Option<D>, AppError>;

    /// Runs after every successful insert, update or delete of `doc`.
    async fn after_write(&self, _doc: &D) -> Result<(), AppError> {
        Ok(())
    }
}
