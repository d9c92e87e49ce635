//! Tour listing aliases, aggregations and geospatial queries.

use std::sync::Arc;

use super::crud_service::CrudService;
use crate::domain::entities::{MonthlyPlan, Tour, TourDistance, TourStats};
use crate::domain::geo::{DistanceUnit, LatLng};
use crate::domain::repositories::TourRepository;
use crate::error::AppError;

/// Query parameters behind `/tours/top-5-cheap`.
pub const TOP_CHEAP_ALIAS: [(&str, &str); 3] = [
    ("limit", "5"),
    ("sort", "-ratingsAverage,price"),
    ("fields", "name,price,ratingsAverage,summary,difficulty"),
];

pub struct TourService<R: TourRepository> {
    crud: CrudService<Tour, R>,
    repository: Arc<R>,
}

impl<R: TourRepository> TourService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            crud: CrudService::new(repository.clone()),
            repository,
        }
    }

    pub fn crud(&self) -> &CrudService<Tour, R> {
        &self.crud
    }

    /// Appends the top-5-cheap alias to the request's own parameters. Since the
    /// last occurrence of a key wins, the alias overrides the caller.
    pub fn top_cheap_params(mut params: Vec<(String, String)>) -> Vec<(String, String)> {
        params.extend(
            TOP_CHEAP_ALIAS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        params
    }

    pub async fn stats(&self) -> Result<Vec<TourStats>, AppError> {
        self.repository.stats().await
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for years outside `1..=9999`.
    pub async fn monthly_plan(&self, year: i32) -> Result<Vec<MonthlyPlan>, AppError> {
        if !(1..=9999).contains(&year) {
            return Err(AppError::cast("year", &year.to_string()));
        }
        self.repository.monthly_plan(year).await
    }

    /// Tours starting within `distance` (in `unit`) of `center`.
    pub async fn within(
        &self,
        distance: f64,
        center: LatLng,
        unit: DistanceUnit,
    ) -> Result<Vec<Tour>, AppError> {
        let radians = unit.to_radians(distance);
        tracing::debug!(distance, radians, ?center, "tours within radius");
        self.repository.within(center, radians).await
    }

    pub async fn distances(
        &self,
        center: LatLng,
        unit: DistanceUnit,
    ) -> Result<Vec<TourDistance>, AppError> {
        self.repository.distances(center, unit.multiplier()).await
    }
}
