//! Handlers for the signed-in user's account and user administration.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::json;

use super::factory::{self, DocumentResponse, ListResponse, list_features};
use crate::api::dto::envelope::{ApiResponse, UserData};
use crate::api::dto::user::{UpdateMeRequest, UpdateUserRequest};
use crate::api::extractors::{AppJson, AppPath, QueryPairs};
use crate::api::middleware::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/v1/users/me`
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<DocumentResponse, AppError> {
    factory::get_one(state.user_service.crud(), &user.id.to_string(), false).await
}

/// `PATCH /api/v1/users/updateMe`
///
/// Changes `name`, `email` and `photo` only.
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<ApiResponse<UserData>>, AppError> {
    let patch = payload.into_patch()?;
    let user = state.user_service.update_me(user.id, patch).await?;
    Ok(Json(ApiResponse::new(UserData { user })))
}

/// `DELETE /api/v1/users/deleteMe`
///
/// Deactivates the account. It disappears from every lookup and its tokens
/// stop working.
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, AppError> {
    state.user_service.deactivate(user.id).await?;
    tracing::info!(user_id = %user.id, "account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/users`
pub async fn get_all_users(
    State(state): State<AppState>,
    QueryPairs(params): QueryPairs,
) -> Result<ListResponse, AppError> {
    factory::get_all(state.user_service.crud(), list_features(params)?).await
}

/// `POST /api/v1/users`. Accounts are created through sign-up only.
pub async fn create_user() -> AppError {
    AppError::server(
        "This route is not defined! Please use /signup instead",
        json!({}),
    )
}

/// `GET /api/v1/users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<DocumentResponse, AppError> {
    factory::get_one(state.user_service.crud(), &id, false).await
}

/// `PATCH /api/v1/users/{id}`. Passwords cannot be changed here.
pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<DocumentResponse, AppError> {
    let patch = payload.into_patch()?;
    factory::update_one(state.user_service.crud(), &id, patch).await
}

/// `DELETE /api/v1/users/{id}` removes the account for good.
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<StatusCode, AppError> {
    factory::delete_one(state.user_service.crud(), &id).await
}
