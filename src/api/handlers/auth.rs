//! Handlers for sign-up, login and password management.
//!
//! Every successful sign-in answers with the token in the body and in the
//! `jwt` cookie.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use serde_json::json;

use crate::api::dto::envelope::{AuthResponse, MessageResponse, SUCCESS};
use crate::api::dto::user::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdatePasswordRequest,
};
use crate::api::extractors::{AppJson, AppPath};
use crate::api::middleware::auth::CurrentUser;
use crate::application::services::Session;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookie::{LOGGED_OUT, session_cookie};

/// Lifetime of the cookie that replaces the session on logout.
const LOGOUT_COOKIE_SECONDS: i64 = 10;

fn send_session(
    state: &AppState,
    session: Session,
    status: StatusCode,
) -> impl IntoResponse + use<> {
    let max_age = state.cookie_ttl_days * 24 * 60 * 60;
    let cookie = session_cookie(&session.token, max_age, state.secure_cookies());

    (
        status,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse::new(session.token, session.user)),
    )
}

/// `POST /api/v1/users/signup`
///
/// New accounts always get the `user` role.
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth_service.signup(payload.into_signup()?).await?;
    Ok(send_session(&state, session, StatusCode::CREATED))
}

/// `POST /api/v1/users/login`
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = payload.credentials()?;
    let session = state.auth_service.login(&email, &password).await?;
    Ok(send_session(&state, session, StatusCode::OK))
}

/// `GET /api/v1/users/logout`
///
/// Overwrites the session cookie with a short-lived placeholder.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = session_cookie(LOGGED_OUT, LOGOUT_COOKIE_SECONDS, state.secure_cookies());
    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(json!({ "status": SUCCESS })),
    )
}

/// `POST /api/v1/users/forgotPassword`
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth_service.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse::new("Token sent to email!")))
}

/// `PATCH /api/v1/users/resetPassword/{token}`
pub async fn reset_password(
    State(state): State<AppState>,
    AppPath(token): AppPath<String>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password = payload.into_password()?;
    let session = state.auth_service.reset_password(&token, &password).await?;
    Ok(send_session(&state, session, StatusCode::OK))
}

/// `PATCH /api/v1/users/updateMyPassword`
///
/// Tokens issued before the change stop working.
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (current, password) = payload.into_passwords()?;
    let session = state
        .auth_service
        .update_password(user.id, &current, &password)
        .await?;
    Ok(send_session(&state, session, StatusCode::OK))
}
