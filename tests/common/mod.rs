#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use tour_booking::api::middleware::rate_limit::RateLimitMode;
use tour_booking::config::{RunMode, SessionSettings};
use tour_booking::domain::entities::{
    Difficulty, GeoPoint, NewReview, NewTour, NewUser, Review, Role, Tour, User,
};
use tour_booking::domain::mailer::{Email, Mailer};
use tour_booking::domain::repositories::{CrudRepository, ReviewRepository};
use tour_booking::error::AppError;
use tour_booking::infrastructure::persistence::{
    PgReviewRepository, PgTourRepository, PgUserRepository,
};
use tour_booking::routes::build_router;
use tour_booking::state::AppState;
use tour_booking::utils::jwt::JwtManager;
use tour_booking::utils::password::hash_password;

pub const TEST_SECRET: &str = "test-signing-secret-that-is-long-enough";
pub const TEST_PASSWORD: &str = "pass1234";
pub const PUBLIC_URL: &str = "http://tours.test";

/// Mailer that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<Email> {
        self.sent.lock().unwrap().last().cloned()
    }

    /// The reset token embedded in the last message.
    pub fn last_reset_token(&self) -> Option<String> {
        let email = self.last()?;
        let start = email.text.find("/resetPassword/")? + "/resetPassword/".len();
        let token: String = email.text[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        Some(token)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::internal("smtp unavailable", json!({})));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub fn settings(run_mode: RunMode) -> SessionSettings {
    SessionSettings {
        run_mode,
        jwt_secret: TEST_SECRET.to_string(),
        jwt_ttl_days: 90,
        cookie_ttl_days: 90,
        public_url: PUBLIC_URL.to_string(),
    }
}

pub fn create_test_state_with(
    pool: PgPool,
    run_mode: RunMode,
    mailer: Arc<RecordingMailer>,
) -> AppState {
    AppState::new(Arc::new(pool), settings(run_mode), mailer)
}

pub fn create_test_state(pool: PgPool) -> (AppState, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let state = create_test_state_with(pool, RunMode::Production, mailer.clone());
    (state, mailer)
}

pub fn server_for(state: AppState) -> TestServer {
    TestServer::new(build_router(state, RateLimitMode::Disabled)).unwrap()
}

pub fn make_server(pool: PgPool) -> (TestServer, Arc<RecordingMailer>) {
    let (state, mailer) = create_test_state(pool);
    (server_for(state), mailer)
}

pub fn token_for(user_id: Uuid) -> String {
    JwtManager::new(TEST_SECRET, 90).issue(user_id).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn create_user(pool: &PgPool, name: &str, email: &str, role: Role) -> User {
    let password = hash_password(TEST_PASSWORD).await.unwrap();
    PgUserRepository::new(Arc::new(pool.clone()))
        .insert(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            photo: None,
            role,
            password,
        })
        .await
        .unwrap()
}

/// Creates a user and returns it with a valid bearer header.
pub async fn login_as(pool: &PgPool, email: &str, role: Role) -> (User, String) {
    let user = create_user(pool, "Test Person", email, role).await;
    let header = bearer(&token_for(user.id));
    (user, header)
}

pub fn start_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
}

pub fn new_tour(name: &str, price: f64, difficulty: Difficulty) -> NewTour {
    NewTour {
        name: name.to_string(),
        slug: tour_booking::utils::slug::slugify(name),
        duration: 5,
        max_group_size: 25,
        difficulty,
        ratings_average: 4.5,
        ratings_quantity: 0,
        price,
        price_discount: None,
        summary: "Breathtaking hike through the Canadian Banff National Park".to_string(),
        description: None,
        image_cover: "tour-1-cover.jpg".to_string(),
        images: vec![],
        start_dates: vec![],
        secret_tour: false,
        start_location: None,
        locations: vec![],
        guides: vec![],
    }
}

pub async fn insert_tour(pool: &PgPool, tour: NewTour) -> Tour {
    PgTourRepository::new(Arc::new(pool.clone()))
        .insert(tour)
        .await
        .unwrap()
}

pub async fn create_tour(pool: &PgPool, name: &str, price: f64, difficulty: Difficulty) -> Tour {
    insert_tour(pool, new_tour(name, price, difficulty)).await
}

/// A tour starting at `lng`, `lat`.
pub async fn create_located_tour(pool: &PgPool, name: &str, lng: f64, lat: f64) -> Tour {
    let mut tour = new_tour(name, 497.0, Difficulty::Easy);
    tour.start_location = Some(GeoPoint::new(lng, lat));
    insert_tour(pool, tour).await
}

pub async fn create_review(
    pool: &PgPool,
    tour_id: Uuid,
    user_id: Uuid,
    rating: f64,
) -> Review {
    let repository = PgReviewRepository::new(Arc::new(pool.clone()));
    let review = repository
        .insert(NewReview {
            review: "Lovely trip with great guides".to_string(),
            rating,
            tour: tour_id,
            user: user_id,
        })
        .await
        .unwrap();
    repository.calc_average_ratings(tour_id).await.unwrap();
    review
}

pub async fn tour_ratings(pool: &PgPool, tour_id: Uuid) -> (i32, f64) {
    sqlx::query_as("SELECT ratings_quantity, ratings_average FROM tours WHERE id = $1")
        .bind(tour_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
