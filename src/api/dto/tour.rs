//! DTOs for tour endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::entities::{Difficulty, GeoPoint, Location, NewTour, TourPatch};
use crate::error::AppError;
use crate::utils::slug::slugify;

const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

/// Request body for `POST /api/v1/tours`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_discount"))]
pub struct CreateTourRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(
        required(message = "A tour must have a name"),
        length(min = 10, max = 40, message = "A tour name must have between 10 and 40 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "A tour must have a duration"),
        range(min = 1, message = "A tour must last at least one day")
    )]
    pub duration: Option<i32>,

    #[validate(
        required(message = "A tour must have a group size"),
        range(min = 1, message = "A tour group must have at least one person")
    )]
    pub max_group_size: Option<i32>,

    #[validate(required(message = "A tour must have a difficulty"))]
    pub difficulty: Option<String>,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,

    pub ratings_quantity: Option<i32>,

    #[validate(
        required(message = "A tour must have a price"),
        range(min = 0.0, message = "A tour price cannot be negative")
    )]
    pub price: Option<f64>,

    pub price_discount: Option<f64>,

    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(required(message = "A tour must have a summary"))]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "super::trimmed")]
    pub description: Option<String>,

    #[validate(required(message = "A tour must have a cover image"))]
    pub image_cover: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,

    #[serde(default)]
    pub secret_tour: bool,

    pub start_location: Option<GeoPoint>,

    #[serde(default)]
    pub locations: Vec<Location>,

    #[serde(default)]
    pub guides: Vec<String>,
}

/// Request body for `PATCH /api/v1/tours/{id}`. Absent fields are unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_discount"))]
pub struct UpdateTourRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(
        min = 10,
        max = 40,
        message = "A tour name must have between 10 and 40 characters"
    ))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "A tour must last at least one day"))]
    pub duration: Option<i32>,
    #[validate(range(min = 1, message = "A tour group must have at least one person"))]
    pub max_group_size: Option<i32>,
    pub difficulty: Option<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<i32>,
    #[validate(range(min = 0.0, message = "A tour price cannot be negative"))]
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    #[serde(default, deserialize_with = "super::trimmed")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "super::trimmed")]
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<GeoPoint>,
    pub locations: Option<Vec<Location>>,
    pub guides: Option<Vec<String>>,
}

fn discount_error(discount: f64) -> ValidationError {
    ValidationError::new("price_discount").with_message(
        format!("Discount price ({discount}) should be below regular price").into(),
    )
}

fn check_discount(price: Option<f64>, discount: Option<f64>) -> Result<(), ValidationError> {
    match (price, discount) {
        (Some(price), Some(discount)) if discount >= price => Err(discount_error(discount)),
        _ => Ok(()),
    }
}

fn validate_create_discount(req: &CreateTourRequest) -> Result<(), ValidationError> {
    check_discount(req.price, req.price_discount)
}

fn validate_update_discount(req: &UpdateTourRequest) -> Result<(), ValidationError> {
    check_discount(req.price, req.price_discount)
}

/// Runs the derived validations and adds the difficulty check, so every
/// problem is reported in one response.
fn validate_with_difficulty<T: Validate>(
    req: &T,
    difficulty: Option<&str>,
) -> Result<Option<Difficulty>, AppError> {
    let mut errors = req.validate().err().unwrap_or_else(ValidationErrors::new);

    let parsed = match difficulty.map(str::parse::<Difficulty>) {
        Some(Ok(d)) => Some(d),
        Some(Err(_)) => {
            errors.add(
                "difficulty",
                ValidationError::new("difficulty")
                    .with_message("Difficulty is either: easy, medium, difficult".into()),
            );
            None
        }
        None => None,
    };

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors.into())
    }
}

fn parse_guides(raw: Vec<String>) -> Result<Vec<Uuid>, AppError> {
    raw.iter()
        .map(|id| Uuid::parse_str(id).map_err(|_| AppError::cast("guides", id)))
        .collect()
}

impl CreateTourRequest {
    /// Validates the body and converts it into a [`NewTour`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] listing every failed check, or a cast
    /// error for a malformed guide id.
    pub fn into_new_tour(self) -> Result<NewTour, AppError> {
        let difficulty = validate_with_difficulty(&self, self.difficulty.as_deref())?;
        let name = self.name.unwrap_or_default();

        Ok(NewTour {
            slug: slugify(&name),
            name,
            duration: self.duration.unwrap_or_default(),
            max_group_size: self.max_group_size.unwrap_or_default(),
            difficulty: difficulty.unwrap_or(Difficulty::Easy),
            ratings_average: self.ratings_average.unwrap_or(DEFAULT_RATINGS_AVERAGE),
            ratings_quantity: self.ratings_quantity.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            price_discount: self.price_discount,
            summary: self.summary.unwrap_or_default(),
            description: self.description,
            image_cover: self.image_cover.unwrap_or_default(),
            images: self.images,
            start_dates: self.start_dates,
            secret_tour: self.secret_tour,
            start_location: self.start_location,
            locations: self.locations,
            guides: parse_guides(self.guides)?,
        })
    }
}

impl UpdateTourRequest {
    /// Validates the body and converts it into a [`TourPatch`]. A new name
    /// also yields a new slug.
    pub fn into_patch(self) -> Result<TourPatch, AppError> {
        let difficulty = validate_with_difficulty(&self, self.difficulty.as_deref())?;

        Ok(TourPatch {
            slug: self.name.as_deref().map(slugify),
            name: self.name,
            duration: self.duration,
            max_group_size: self.max_group_size,
            difficulty,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary,
            description: self.description,
            image_cover: self.image_cover,
            images: self.images,
            start_dates: self.start_dates,
            secret_tour: self.secret_tour,
            start_location: self.start_location,
            locations: self.locations,
            guides: self.guides.map(parse_guides).transpose()?,
        })
    }
}
