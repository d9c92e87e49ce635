//! Handlers for tour endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use super::factory::{self, DocumentResponse, ListResponse, list_features};
use crate::api::dto::envelope::{ApiResponse, Data};
use crate::api::dto::tour::{CreateTourRequest, UpdateTourRequest};
use crate::api::extractors::{AppJson, AppPath, QueryPairs};
use crate::application::services::TourService;
use crate::application::services::crud_service::to_document_value;
use crate::domain::geo::{DistanceUnit, LatLng, parse_distance};
use crate::domain::query_features::Projection;
use crate::error::AppError;
use crate::infrastructure::persistence::PgTourRepository;
use crate::state::AppState;

/// `GET /api/v1/tours`
///
/// Supports filtering (`price[lt]=1500`), `sort`, `fields`, `page` and
/// `limit`. Secret tours are never listed.
pub async fn get_all_tours(
    State(state): State<AppState>,
    QueryPairs(params): QueryPairs,
) -> Result<ListResponse, AppError> {
    factory::get_all(state.tour_service.crud(), list_features(params)?).await
}

/// `GET /api/v1/tours/top-5-cheap`
///
/// The five best rated tours, cheapest first on ties, with a reduced field
/// set. Overrides any `limit`, `sort` or `fields` given by the caller.
pub async fn top_cheap_tours(
    State(state): State<AppState>,
    QueryPairs(params): QueryPairs,
) -> Result<ListResponse, AppError> {
    let params = TourService::<PgTourRepository>::top_cheap_params(params);
    factory::get_all(state.tour_service.crud(), list_features(params)?).await
}

/// `GET /api/v1/tours/tour-stats`
pub async fn tour_stats(State(state): State<AppState>) -> Result<Json<ApiResponse<Value>>, AppError> {
    let stats = state.tour_service.stats().await?;
    Ok(Json(ApiResponse::new(json!({ "stats": stats }))))
}

/// `GET /api/v1/tours/monthly-plan/{year}`
pub async fn monthly_plan(
    State(state): State<AppState>,
    AppPath(year): AppPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let year: i32 = year.parse().map_err(|_| AppError::cast("year", &year))?;
    let plan = state.tour_service.monthly_plan(year).await?;
    Ok(Json(ApiResponse::new(json!({ "plan": plan }))))
}

/// `GET /api/v1/tours/tours-within/{distance}/center/{latlng}/unit/{unit}`
///
/// Tours whose start location lies within `distance` of `latlng`.
pub async fn tours_within(
    State(state): State<AppState>,
    AppPath((distance, latlng, unit)): AppPath<(String, String, String)>,
) -> Result<ListResponse, AppError> {
    let center: LatLng = latlng.parse()?;
    let unit: DistanceUnit = unit.parse()?;
    let distance = parse_distance(&distance)?;

    let tours = state.tour_service.within(distance, center, unit).await?;
    let items = tours
        .iter()
        .map(|tour| to_document_value(tour, &Projection::default()))
        .collect::<Result<Vec<_>, _>>()?;
    let total = items.len() as i64;

    Ok(Json(ApiResponse::list(items, total)))
}

/// `GET /api/v1/tours/distances/{latlng}/unit/{unit}`
///
/// Distance from `latlng` to the start of every located tour, nearest first.
pub async fn tour_distances(
    State(state): State<AppState>,
    AppPath((latlng, unit)): AppPath<(String, String)>,
) -> Result<Json<ApiResponse<Data<Value>>>, AppError> {
    let center: LatLng = latlng.parse()?;
    let unit: DistanceUnit = unit.parse()?;

    let distances = state.tour_service.distances(center, unit).await?;
    Ok(Json(Data::wrap(json!(distances))))
}

/// `GET /api/v1/tours/{id}`, with guides and reviews populated.
pub async fn get_tour(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<DocumentResponse, AppError> {
    factory::get_one(state.tour_service.crud(), &id, true).await
}

/// `POST /api/v1/tours`
pub async fn create_tour(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTourRequest>,
) -> Result<(StatusCode, DocumentResponse), AppError> {
    let new = payload.into_new_tour()?;
    factory::create_one(state.tour_service.crud(), new).await
}

/// `PATCH /api/v1/tours/{id}`
pub async fn update_tour(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateTourRequest>,
) -> Result<DocumentResponse, AppError> {
    let patch = payload.into_patch()?;
    factory::update_one(state.tour_service.crud(), &id, patch).await
}

/// `DELETE /api/v1/tours/{id}`
pub async fn delete_tour(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<StatusCode, AppError> {
    factory::delete_one(state.tour_service.crud(), &id).await
}
