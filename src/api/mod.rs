//! REST API layer for HTTP request/response handling.
//!
//! This layer translates HTTP requests into service calls and formats
//! responses according to the API contract.
//!
//! # Modules
//!
//! - [`dto`] - Request validation and response envelopes
//! - [`extractors`] - Extractors that reject with JSON errors
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication, rate limiting and request processing
//! - [`routes`] - Route configuration and composition

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
