//! Review entity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;
use uuid::Uuid;

/// The author of a review as shown next to it.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub name: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub review: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub tour: Uuid,
    pub user: ReviewAuthor,
    pub revision: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub review: String,
    pub rating: f64,
    pub tour: Uuid,
    pub user: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub review: Option<String>,
    pub rating: Option<f64>,
}

/// Recomputed rating aggregate of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingsSummary {
    pub ratings_quantity: i32,
    pub ratings_average: f64,
}
