//! Repository trait definitions for the domain layer.
//!
//! # Architecture
//!
//! - [`CrudRepository`] is the generic contract behind the CRUD handler factory
//! - Entity repositories extend it with their specific queries
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are generated via `mockall` for testing
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod crud_repository;
pub mod review_repository;
pub mod tour_repository;
pub mod user_repository;

pub use crud_repository::CrudRepository;
pub use review_repository::ReviewRepository;
pub use tour_repository::TourRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use review_repository::MockReviewRepo;
#[cfg(test)]
pub use tour_repository::MockTourRepo;
#[cfg(test)]
pub use user_repository::MockUserRepo;
