//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide a clean API for HTTP
//! handlers.
//!
//! # Available Services
//!
//! - [`services::crud_service::CrudService`] - Generic list/get/create/update/delete
//! - [`services::tour_service::TourService`] - Tour aliases, statistics and geo queries
//! - [`services::user_service::UserService`] - Self-service account management
//! - [`services::auth_service::AuthService`] - Sign-up, login, sessions and password resets

pub mod services;
