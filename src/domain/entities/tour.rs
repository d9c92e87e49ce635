//! Tour entity and the aggregates computed over tours.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::skip_serializing_none;
use uuid::Uuid;

use super::review::Review;
use super::user::Role;
use crate::error::AppError;

/// Difficulty level of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "difficult" => Ok(Difficulty::Difficult),
            other => Err(AppError::bad_request(
                "Invalid input data. Difficulty is either: easy, medium, difficult",
                json!({ "difficulty": other }),
            )),
        }
    }
}

/// GeoJSON point. Coordinates are `[longitude, latitude]`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    pub coordinates: [f64; 2],
    pub address: Option<String>,
    pub description: Option<String>,
}

fn point_type() -> String {
    "Point".to_string()
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: point_type(),
            coordinates: [lng, lat],
            address: None,
            description: None,
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

/// A stop on the tour itinerary.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(flatten)]
    pub point: GeoPoint,
    pub day: Option<i32>,
}

/// Public projection of a user acting as a tour guide.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guide {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub role: Role,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub start_dates: Vec<DateTime<Utc>>,
    pub secret_tour: bool,
    pub start_location: Option<GeoPoint>,
    pub locations: Vec<Location>,
    pub guides: Vec<Guide>,
    /// Derived from `duration`.
    pub duration_weeks: f64,
    /// Only present when the tour was loaded with its reviews.
    pub reviews: Option<Vec<Review>>,
    pub revision: i32,
}

impl Tour {
    pub fn weeks(duration: i32) -> f64 {
        f64::from(duration) / 7.0
    }
}

/// Input data for creating a tour.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTour {
    pub name: String,
    pub slug: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    pub start_dates: Vec<DateTime<Utc>>,
    pub secret_tour: bool,
    pub start_location: Option<GeoPoint>,
    pub locations: Vec<Location>,
    pub guides: Vec<Uuid>,
}

/// Partial update of a tour. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<GeoPoint>,
    pub locations: Option<Vec<Location>>,
    pub guides: Option<Vec<Uuid>>,
}

/// Per-difficulty statistics over highly rated tours.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourStats {
    pub difficulty: String,
    pub num_tours: i64,
    pub num_ratings: i64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Tour starts within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlan {
    pub month: i32,
    pub num_tour_starts: i64,
    pub tours: Vec<String>,
}

/// Distance from a reference point to a tour's start location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourDistance {
    pub id: Uuid,
    pub name: String,
    pub distance: f64,
}
