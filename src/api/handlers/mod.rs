//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints;
//! [`factory`] holds the CRUD handlers they share.

pub mod auth;
pub mod factory;
pub mod fallback;
pub mod health;
pub mod reviews;
pub mod tours;
pub mod users;

pub use fallback::not_found;
pub use health::health_handler;
