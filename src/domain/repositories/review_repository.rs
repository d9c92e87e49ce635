//! Review-specific queries.

use async_trait::async_trait;
use uuid::Uuid;

use super::CrudRepository;
use crate::domain::entities::{RatingsSummary, Review};
use crate::error::AppError;

#[async_trait]
pub trait ReviewRepository: CrudRepository<Review> {
    /// Recomputes `ratingsQuantity` and `ratingsAverage` of a tour from all of
    /// its reviews. A tour without reviews resets to `0` and `4.5`.
    async fn calc_average_ratings(&self, tour_id: Uuid) -> Result<RatingsSummary, AppError>;
}

#[cfg(test)]
mockall::mock! {
    pub ReviewRepo {}

    #[async_trait]
    impl CrudRepository<Review> for ReviewRepo {
        async fn find_all(&self, features: &crate::domain::query_features::QueryFeatures) -> Result<Vec<Review>, AppError>;
        async fn count(&self, features: &crate::domain::query_features::QueryFeatures) -> Result<i64, AppError>;
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError>;
        async fn find_by_id_populated(&self, id: Uuid) -> Result<Option<Review>, AppError>;
        async fn insert(&self, new: crate::domain::entities::NewReview) -> Result<Review, AppError>;
        async fn update(&self, id: Uuid, patch: crate::domain::entities::ReviewPatch) -> Result<Option<Review>, AppError>;
        async fn delete(&self, id: Uuid) -> Result<Option<Review>, AppError>;
        async fn after_write(&self, doc: &Review) -> Result<(), AppError>;
    }

    #[async_trait]
    impl ReviewRepository for ReviewRepo {
        async fn calc_average_ratings(&self, tour_id: Uuid) -> Result<RatingsSummary, AppError>;
    }
}
