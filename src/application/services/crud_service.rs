//! Generic CRUD operations over any [`Document`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::query_features::{Projection, QueryFeatures};
use crate::domain::repositories::CrudRepository;
use crate::error::AppError;

/// Message returned whenever an id matches no visible document.
pub const NOT_FOUND_MESSAGE: &str = "No document found with that ID";

/// One page of a listing, already projected.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    /// Number of documents matching the filters across all pages.
    pub total: i64,
}

/// Service behind the generic handler factory.
///
/// Writes go through the repository and then trigger
/// [`CrudRepository::after_write`]. A failing hook is logged and does not
/// undo the write.
pub struct CrudService<D: Document, R: CrudRepository<D>> {
    repository: Arc<R>,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document, R: CrudRepository<D>> CrudService<D, R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            _document: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Lists documents and applies the requested projection.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for filter values that cannot be cast.
    pub async fn get_all(&self, features: QueryFeatures) -> Result<Page, AppError> {
        let documents = self.repository.find_all(&features).await?;
        let total = self.repository.count(&features).await?;

        let items = documents
            .iter()
            .map(|doc| to_document_value(doc, features.projection()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { items, total })
    }

    /// Fetches a document by id, optionally with its reverse relations.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no visible document has `id`.
    pub async fn get_one(&self, id: Uuid, populate: bool) -> Result<D, AppError> {
        let found = if populate {
            self.repository.find_by_id_populated(id).await?
        } else {
            self.repository.find_by_id(id).await?
        };

        found.ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, new: D::Create) -> Result<D, AppError> {
        let doc = self.repository.insert(new).await?;
        self.after_write(&doc).await;
        Ok(doc)
    }

    pub async fn update(&self, id: Uuid, patch: D::Patch) -> Result<D, AppError> {
        let doc = self
            .repository
            .update(id, patch)
            .await?
            .ok_or_else(|| not_found(id))?;
        self.after_write(&doc).await;
        Ok(doc)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let doc = self
            .repository
            .delete(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        self.after_write(&doc).await;
        Ok(())
    }

    async fn after_write(&self, doc: &D) {
        if let Err(e) = self.repository.after_write(doc).await {
            tracing::warn!(error = %e, "post-write hook failed");
        }
    }
}

/// Serializes a document and applies `projection` to it.
pub fn to_document_value<D: Document>(doc: &D, projection: &Projection) -> Result<Value, AppError> {
    let value = serde_json::to_value(doc).map_err(|e| {
        AppError::internal("Failed to serialize document", json!({ "reason": e.to_string() }))
    })?;
    Ok(projection.apply(value))
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(NOT_FOUND_MESSAGE, json!({ "id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Review, ReviewAuthor, ReviewPatch};
    use crate::domain::repositories::MockReviewRepo;
    use chrono::Utc;

    fn review(rating: f64) -> Review {
        Review {
            id: Uuid::new_v4(),
            review: "Amazing tour, would book again".into(),
            rating,
            created_at: Utc::now(),
            tour: Uuid::new_v4(),
            user: ReviewAuthor {
                id: Uuid::new_v4(),
                name: "Lisa Brown".into(),
                photo: None,
            },
            revision: 0,
        }
    }

    #[tokio::test]
    async fn test_get_all_projects_and_counts() {
        let mut repo = MockReviewRepo::new();
        repo.expect_find_all()
            .times(1)
            .returning(|_| Ok(vec![review(5.0), review(4.0)]));
        repo.expect_count().times(1).returning(|_| Ok(7));

        let service: CrudService<Review, _> = CrudService::new(Arc::new(repo));
        let features = QueryFeatures::new(vec![("fields".into(), "rating".into())])
            .limit_fields()
            .unwrap();

        let page = service.get_all(features).await.unwrap();

        assert_eq!(page.total, 7);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0]["rating"], 5.0);
        assert!(page.items[0].get("review").is_none());
        assert!(page.items[0].get("id").is_some());
    }

    #[tokio::test]
    async fn test_get_one_not_found() {
        let mut repo = MockReviewRepo::new();
        repo.expect_find_by_id().times(1).returning(|_| Ok(None));

        let service: CrudService<Review, _> = CrudService::new(Arc::new(repo));
        let err = service.get_one(Uuid::new_v4(), false).await.unwrap_err();

        assert_eq!(err.to_string(), NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_get_one_populated_uses_populated_lookup() {
        let mut repo = MockReviewRepo::new();
        repo.expect_find_by_id_populated()
            .times(1)
            .returning(|_| Ok(Some(review(3.0))));
        repo.expect_find_by_id().never();

        let service: CrudService<Review, _> = CrudService::new(Arc::new(repo));
        let found = service.get_one(Uuid::new_v4(), true).await.unwrap();

        assert_eq!(found.rating, 3.0);
    }

    #[tokio::test]
    async fn test_update_runs_after_write_hook() {
        let mut repo = MockReviewRepo::new();
        repo.expect_update()
            .times(1)
            .returning(|_, _| Ok(Some(review(2.0))));
        repo.expect_after_write().times(1).returning(|_| Ok(()));

        let service: CrudService<Review, _> = CrudService::new(Arc::new(repo));
        let patch = ReviewPatch {
            rating: Some(2.0),
            ..Default::default()
        };

        let updated = service.update(Uuid::new_v4(), patch).await.unwrap();
        assert_eq!(updated.rating, 2.0);
    }

    #[tokio::test]
    async fn test_failing_hook_does_not_fail_write() {
        let mut repo = MockReviewRepo::new();
        repo.expect_delete()
            .times(1)
            .returning(|_| Ok(Some(review(4.0))));
        repo.expect_after_write()
            .times(1)
            .returning(|_| Err(AppError::internal("recalc failed", json!({}))));

        let service: CrudService<Review, _> = CrudService::new(Arc::new(repo));
        assert!(service.delete(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_document() {
        let mut repo = MockReviewRepo::new();
        repo.expect_delete().times(1).returning(|_| Ok(None));
        repo.expect_after_write().never();

        let service: CrudService<Review, _> = CrudService::new(Arc::new(repo));
        let err = service.delete(Uuid::new_v4()).await.unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
