//! Shared application state handed to every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{AuthService, CrudService, TourService, UserService};
use crate::config::{RunMode, SessionSettings};
use crate::domain::entities::Review;
use crate::domain::mailer::Mailer;
use crate::infrastructure::persistence::{
    PgReviewRepository, PgTourRepository, PgUserRepository,
};
use crate::utils::jwt::JwtManager;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PgPool>,
    pub tour_service: Arc<TourService<PgTourRepository>>,
    pub review_service: Arc<CrudService<Review, PgReviewRepository>>,
    pub user_service: Arc<UserService<PgUserRepository>>,
    pub auth_service: Arc<AuthService<PgUserRepository>>,
    pub run_mode: RunMode,
    /// Lifetime of the `jwt` cookie.
    pub cookie_ttl_days: i64,
}

impl AppState {
    /// Wires repositories and services over `pool`.
    pub fn new(pool: Arc<PgPool>, settings: SessionSettings, mailer: Arc<dyn Mailer>) -> Self {
        let tour_repository = Arc::new(PgTourRepository::new(pool.clone()));
        let review_repository = Arc::new(PgReviewRepository::new(pool.clone()));
        let user_repository = Arc::new(PgUserRepository::new(pool.clone()));

        let jwt = JwtManager::new(&settings.jwt_secret, settings.jwt_ttl_days);

        Self {
            tour_service: Arc::new(TourService::new(tour_repository)),
            review_service: Arc::new(CrudService::new(review_repository)),
            user_service: Arc::new(UserService::new(user_repository.clone())),
            auth_service: Arc::new(AuthService::new(
                user_repository,
                jwt,
                mailer,
                settings.public_url,
            )),
            run_mode: settings.run_mode,
            cookie_ttl_days: settings.cookie_ttl_days,
            pool,
        }
    }

    /// Cookies are marked `Secure` outside development.
    pub fn secure_cookies(&self) -> bool {
        !self.run_mode.is_development()
    }
}
