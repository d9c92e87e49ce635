//! Handlers for review endpoints, including the routes nested under a tour.

use axum::{extract::State, http::StatusCode};

use super::factory::{self, DocumentResponse, ListResponse, list_features};
use crate::api::dto::review::{CreateReviewRequest, UpdateReviewRequest};
use crate::api::extractors::{AppJson, AppPath, QueryPairs, parse_id};
use crate::api::middleware::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/v1/reviews`
pub async fn get_all_reviews(
    State(state): State<AppState>,
    QueryPairs(params): QueryPairs,
) -> Result<ListResponse, AppError> {
    factory::get_all(&*state.review_service, list_features(params)?).await
}

/// `GET /api/v1/tours/{id}/reviews`
pub async fn get_tour_reviews(
    State(state): State<AppState>,
    AppPath(tour_id): AppPath<String>,
    QueryPairs(params): QueryPairs,
) -> Result<ListResponse, AppError> {
    let tour_id = parse_id(&tour_id)?;
    let features = list_features(params)?.with_condition("tour", tour_id.to_string());
    factory::get_all(&*state.review_service, features).await
}

/// `GET /api/v1/reviews/{id}`
pub async fn get_review(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<DocumentResponse, AppError> {
    factory::get_one(&*state.review_service, &id, false).await
}

/// `POST /api/v1/reviews`
///
/// The author is the signed-in user. One review per user and tour.
pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<(StatusCode, DocumentResponse), AppError> {
    let new = payload.into_new_review(None, user.id)?;
    factory::create_one(&*state.review_service, new).await
}

/// `POST /api/v1/tours/{id}/reviews`
pub async fn create_tour_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(tour_id): AppPath<String>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<(StatusCode, DocumentResponse), AppError> {
    let tour_id = parse_id(&tour_id)?;
    let new = payload.into_new_review(Some(tour_id), user.id)?;
    factory::create_one(&*state.review_service, new).await
}

/// `PATCH /api/v1/reviews/{id}`
pub async fn update_review(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<DocumentResponse, AppError> {
    let patch = payload.into_patch()?;
    factory::update_one(&*state.review_service, &id, patch).await
}

/// `DELETE /api/v1/reviews/{id}`
pub async fn delete_review(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<StatusCode, AppError> {
    factory::delete_one(&*state.review_service, &id).await
}
