//! DTOs for review endpoints.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::entities::{NewReview, ReviewPatch};
use crate::error::AppError;

/// Request body for `POST /api/v1/reviews` and `POST /api/v1/tours/{id}/reviews`.
///
/// The author always comes from the session; a `user` field in the body is
/// ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(
        required(message = "Review can not be empty!"),
        length(min = 10, max = 300, message = "Review must contain between 10 and 300 characters")
    )]
    pub review: Option<String>,

    #[validate(
        required(message = "A review must have a rating"),
        range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5")
    )]
    pub rating: Option<f64>,

    pub tour: Option<String>,
}

impl CreateReviewRequest {
    /// Builds the review for `author`. `path_tour` (from a nested route) is
    /// used when the body names no tour.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for failed checks or when no tour is
    /// given at all, and a cast error for a malformed tour id.
    pub fn into_new_review(
        self,
        path_tour: Option<Uuid>,
        author: Uuid,
    ) -> Result<NewReview, AppError> {
        self.validate()?;

        let tour = match self.tour {
            Some(raw) => Uuid::parse_str(&raw).map_err(|_| AppError::cast("tour", &raw))?,
            None => path_tour.ok_or_else(|| {
                AppError::bad_request(
                    "Invalid input data. Review must belong to a tour.",
                    json!({}),
                )
            })?,
        };

        Ok(NewReview {
            review: self.review.unwrap_or_default(),
            rating: self.rating.unwrap_or_default(),
            tour,
            user: author,
        })
    }
}

/// Request body for `PATCH /api/v1/reviews/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(
        min = 10,
        max = 300,
        message = "Review must contain between 10 and 300 characters"
    ))]
    pub review: Option<String>,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f64>,
}

impl UpdateReviewRequest {
    pub fn into_patch(self) -> Result<ReviewPatch, AppError> {
        self.validate()?;
        Ok(ReviewPatch {
            review: self.review,
            rating: self.rating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn request(body: Value) -> CreateReviewRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_tour_from_path_when_body_has_none() {
        let tour = Uuid::new_v4();
        let author = Uuid::new_v4();
        let review = request(json!({ "review": "Amazing tour, loved it!", "rating": 5 }))
            .into_new_review(Some(tour), author)
            .unwrap();
        assert_eq!(review.tour, tour);
        assert_eq!(review.user, author);
    }

    #[test]
    fn test_body_tour_wins_over_path() {
        let body_tour = Uuid::new_v4();
        let review = request(json!({
            "review": "Amazing tour, loved it!",
            "rating": 4,
            "tour": body_tour.to_string()
        }))
        .into_new_review(Some(Uuid::new_v4()), Uuid::new_v4())
        .unwrap();
        assert_eq!(review.tour, body_tour);
    }

    #[test]
    fn test_missing_tour() {
        let err = request(json!({ "review": "Amazing tour, loved it!", "rating": 4 }))
            .into_new_review(None, Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input data. Review must belong to a tour.");
    }

    #[test]
    fn test_rating_out_of_range() {
        let err = request(json!({ "review": "Amazing tour, loved it!", "rating": 6 }))
            .into_new_review(Some(Uuid::new_v4()), Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input data. Rating must be between 1 and 5");
    }
}
