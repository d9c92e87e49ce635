//! API route configuration, mounted under `/api/v1`.
//!
//! Access rules are attached per method with [`guarded`], so public and
//! restricted methods can share a path.

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    routing::{MethodRouter, get, patch, post},
};

use crate::api::handlers::{auth, reviews, tours, users};
use crate::api::middleware::auth::{protect, restrict_to};
use crate::domain::entities::Role;
use crate::state::AppState;

const ADMIN: &[Role] = &[Role::Admin];
const ADMIN_LEAD: &[Role] = &[Role::Admin, Role::LeadGuide];
const STAFF: &[Role] = &[Role::Admin, Role::LeadGuide, Role::Guide];
const USER: &[Role] = &[Role::User];
const USER_ADMIN: &[Role] = &[Role::User, Role::Admin];
const ANY_ROLE: &[Role] = &[];

/// Requires a session for `route` and, unless `roles` is empty, one of `roles`.
pub fn guarded(
    route: MethodRouter<AppState>,
    state: &AppState,
    roles: &'static [Role],
) -> MethodRouter<AppState> {
    let route = if roles.is_empty() {
        route
    } else {
        route.route_layer(middleware::from_fn(move |req: Request, next: Next| {
            restrict_to(roles, req, next)
        }))
    };
    route.route_layer(middleware::from_fn_with_state(state.clone(), protect))
}

/// Tour routes, including reviews nested under a tour.
///
/// - `GET    /tours`                     - List tours (public)
/// - `POST   /tours`                     - Create a tour (admin, lead-guide)
/// - `GET    /tours/top-5-cheap`         - Listing alias (public)
/// - `GET    /tours/tour-stats`          - Per-difficulty statistics (public)
/// - `GET    /tours/monthly-plan/{year}` - Starts per month (staff)
/// - `GET    /tours/tours-within/{distance}/center/{latlng}/unit/{unit}` (public)
/// - `GET    /tours/distances/{latlng}/unit/{unit}` (public)
/// - `GET    /tours/{id}`                - Tour with reviews (public)
/// - `PATCH  /tours/{id}`, `DELETE /tours/{id}` (admin, lead-guide)
/// - `GET    /tours/{id}/reviews`        - Reviews of a tour (logged in)
/// - `POST   /tours/{id}/reviews`        - Review a tour (user)
pub fn tour_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/tours",
            get(tours::get_all_tours).merge(guarded(post(tours::create_tour), state, ADMIN_LEAD)),
        )
        .route("/tours/top-5-cheap", get(tours::top_cheap_tours))
        .route("/tours/tour-stats", get(tours::tour_stats))
        .route(
            "/tours/monthly-plan/{year}",
            guarded(get(tours::monthly_plan), state, STAFF),
        )
        .route(
            "/tours/tours-within/{distance}/center/{latlng}/unit/{unit}",
            get(tours::tours_within),
        )
        .route(
            "/tours/distances/{latlng}/unit/{unit}",
            get(tours::tour_distances),
        )
        .route(
            "/tours/{id}",
            get(tours::get_tour).merge(guarded(
                patch(tours::update_tour).delete(tours::delete_tour),
                state,
                ADMIN_LEAD,
            )),
        )
        .route(
            "/tours/{id}/reviews",
            guarded(get(reviews::get_tour_reviews), state, ANY_ROLE)
                .merge(guarded(post(reviews::create_tour_review), state, USER)),
        )
}

/// User routes.
///
/// - `POST   /users/signup`, `/users/login`, `/users/forgotPassword` (public)
/// - `GET    /users/logout` (public)
/// - `PATCH  /users/resetPassword/{token}` (public)
/// - `PATCH  /users/updateMyPassword`, `GET /users/me`, `PATCH /users/updateMe`,
///   `DELETE /users/deleteMe` (logged in)
/// - `GET|POST /users`, `GET|PATCH|DELETE /users/{id}` (admin)
pub fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(auth::signup))
        .route("/users/login", post(auth::login))
        .route("/users/logout", get(auth::logout))
        .route("/users/forgotPassword", post(auth::forgot_password))
        .route("/users/resetPassword/{token}", patch(auth::reset_password))
        .route(
            "/users/updateMyPassword",
            guarded(patch(auth::update_password), state, ANY_ROLE),
        )
        .route("/users/me", guarded(get(users::get_me), state, ANY_ROLE))
        .route(
            "/users/updateMe",
            guarded(patch(users::update_me), state, ANY_ROLE),
        )
        .route(
            "/users/deleteMe",
            guarded(axum::routing::delete(users::delete_me), state, ANY_ROLE),
        )
        .route(
            "/users",
            guarded(
                get(users::get_all_users).post(users::create_user),
                state,
                ADMIN,
            ),
        )
        .route(
            "/users/{id}",
            guarded(
                get(users::get_user)
                    .patch(users::update_user)
                    .delete(users::delete_user),
                state,
                ADMIN,
            ),
        )
}

/// Review routes. Every method requires a session.
///
/// - `GET    /reviews`, `GET /reviews/{id}` (logged in)
/// - `POST   /reviews` (user)
/// - `PATCH  /reviews/{id}`, `DELETE /reviews/{id}` (user, admin)
pub fn review_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/reviews",
            guarded(get(reviews::get_all_reviews), state, ANY_ROLE)
                .merge(guarded(post(reviews::create_review), state, USER)),
        )
        .route(
            "/reviews/{id}",
            guarded(get(reviews::get_review), state, ANY_ROLE).merge(guarded(
                patch(reviews::update_review).delete(reviews::delete_review),
                state,
                USER_ADMIN,
            )),
        )
}

/// All `/api/v1` routes.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(tour_routes(state))
        .merge(user_routes(state))
        .merge(review_routes(state))
}
