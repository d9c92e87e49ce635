//! Session authentication and role checks.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::domain::entities::{Role, User};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookie;

/// The authenticated user, inserted into request extensions by [`protect`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(not_logged_in)
    }
}

fn not_logged_in() -> AppError {
    AppError::unauthorized(
        "You are not logged in! Please log in to get access.",
        json!({}),
    )
}

/// Requires a valid session.
///
/// The token is read from `Authorization: Bearer <token>` first and from the
/// `jwt` cookie otherwise.
///
/// # Errors
///
/// Returns `401 Unauthorized` if no token is sent, the token is invalid or
/// expired, its user no longer exists, or the password changed after the
/// token was issued.
///
/// # Example
///
/// ```rust,ignore
/// let route = get(get_me).route_layer(middleware::from_fn_with_state(state, auth::protect));
/// ```
pub async fn protect(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = match AuthBearer::from_request_parts(&mut parts, &()).await {
        Ok(AuthBearer(token)) => Some(token),
        Err(_) => cookie::read_token(&parts.headers),
    }
    .ok_or_else(not_logged_in)?;

    let user = st.auth_service.authenticate(&token).await?;
    tracing::debug!(user_id = %user.id, role = %user.role, "request authenticated");
    parts.extensions.insert(CurrentUser(user));

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Allows the request through only if the current user has one of `roles`.
/// Must run after [`protect`].
pub async fn restrict_to(
    roles: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(CurrentUser(user)) = req.extensions().get::<CurrentUser>() else {
        return Err(not_logged_in());
    };

    if !roles.contains(&user.role) {
        return Err(AppError::forbidden(
            "You do not have permission to perform this action",
            json!({ "role": user.role.as_str() }),
        ));
    }

    Ok(next.run(req).await)
}
