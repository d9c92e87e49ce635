//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Tours, users, reviews and their aggregates
//! - [`repositories`] - Data access trait definitions
//! - [`query_features`] - Filtering, sorting, projection and pagination of listings
//! - [`geo`] - Units and coordinates for geospatial queries
//! - [`mailer`] - Outgoing mail port
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod entities;
pub mod geo;
pub mod mailer;
pub mod query_features;
pub mod repositories;
