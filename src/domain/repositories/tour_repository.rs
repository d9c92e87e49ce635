//! Tour-specific queries on top of the generic CRUD contract.

use async_trait::async_trait;

use super::CrudRepository;
use crate::domain::entities::{MonthlyPlan, Tour, TourDistance, TourStats};
use crate::domain::geo::LatLng;
use crate::error::AppError;

#[async_trait]
pub trait TourRepository: CrudRepository<Tour> {
    /// Statistics of tours rated 4.5 or better, grouped by difficulty and
    /// ordered by average price.
    async fn stats(&self) -> Result<Vec<TourStats>, AppError>;

    /// Tour starts per month of `year`, busiest month first, at most 12 rows.
    async fn monthly_plan(&self, year: i32) -> Result<Vec<MonthlyPlan>, AppError>;

    /// Tours whose start location lies within `radians` of `center`.
    async fn within(&self, center: LatLng, radians: f64) -> Result<Vec<Tour>, AppError>;

    /// Distance from `center` to every located tour, nearest first. Metres are
    /// scaled by `multiplier`.
    async fn distances(
        &self,
        center: LatLng,
        multiplier: f64,
    ) -> Result<Vec<TourDistance>, AppError>;
}

#[cfg(test)]
mockall::mock! {
    pub TourRepo {}

    #[async_trait]
    impl CrudRepository<Tour> for TourRepo {
        async fn find_all(&self, features: &crate::domain::query_features::QueryFeatures) -> Result<Vec<Tour>, AppError>;
        async fn count(&self, features: &crate::domain::query_features::QueryFeatures) -> Result<i64, AppError>;
        async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<Tour>, AppError>;
        async fn find_by_id_populated(&self, id: uuid::Uuid) -> Result<Option<Tour>, AppError>;
        async fn insert(&self, new: crate::domain::entities::NewTour) -> Result<Tour, AppError>;
        async fn update(&self, id: uuid::Uuid, patch: crate::domain::entities::TourPatch) -> Result<Option<Tour>, AppError>;
        async fn delete(&self, id: uuid::Uuid) -> Result<Option<Tour>, AppError>;
        async fn after_write(&self, doc: &Tour) -> Result<(), AppError>;
    }

    #[async_trait]
    impl TourRepository for TourRepo {
        async fn stats(&self) -> Result<Vec<TourStats>, AppError>;
        async fn monthly_plan(&self, year: i32) -> Result<Vec<MonthlyPlan>, AppError>;
        async fn within(&self, center: LatLng, radians: f64) -> Result<Vec<Tour>, AppError>;
        async fn distances(&self, center: LatLng, multiplier: f64) -> Result<Vec<TourDistance>, AppError>;
    }
}
