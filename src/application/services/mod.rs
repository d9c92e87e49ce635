//! Business logic services for the application layer.

pub mod auth_service;
pub mod crud_service;
pub mod tour_service;
pub mod user_service;

pub use auth_service::{AuthService, Session, Signup};
pub use crud_service::{CrudService, NOT_FOUND_MESSAGE, Page};
pub use tour_service::TourService;
pub use user_service::UserService;
