//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`Tour`] - A bookable tour with its itinerary and guides
//! - [`User`] - A registered account with a [`Role`]
//! - [`Review`] - A rating left by a user on a tour
//!
//! # Design Pattern
//!
//! Every entity has a companion struct for creation (`NewTour`, `NewUser`,
//! `NewReview`) and one for partial updates (`TourPatch`, `UserPatch`,
//! `ReviewPatch`). The [`Document`] trait ties the three together so the
//! generic CRUD service can work with any of them.

pub mod review;
pub mod tour;
pub mod user;

pub use review::{NewReview, RatingsSummary, Review, ReviewAuthor, ReviewPatch};
pub use tour::{
    Difficulty, GeoPoint, Guide, Location, MonthlyPlan, NewTour, Tour, TourDistance, TourPatch,
    TourStats,
};
pub use user::{NewUser, Role, User, UserPatch};

use serde::Serialize;

/// A stored document served through the generic CRUD endpoints.
pub trait Document: Serialize + Clone + Send + Sync + 'static {
    /// Data required to insert a new document.
    type Create: Send + Sync + 'static;
    /// Partial update payload.
    type Patch: Send + Sync + 'static;
}

impl Document for Tour {
    type Create = NewTour;
    type Patch = TourPatch;
}

impl Document for User {
    type Create = NewUser;
    type Patch = UserPatch;
}

impl Document for Review {
    type Create = NewReview;
    type Patch = ReviewPatch;
}
