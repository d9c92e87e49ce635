//! PostgreSQL repository implementations.
//!
//! Queries are assembled at runtime with SQLx's `QueryBuilder`: listing
//! filters come from the query string and are translated by
//! [`sql_features`] against a per-table column whitelist.
//!
//! # Repositories
//!
//! - [`PgTourRepository`] - Tours, guides, statistics and geo queries
//! - [`PgUserRepository`] - Accounts and credentials
//! - [`PgReviewRepository`] - Reviews and tour rating aggregates

pub mod pg_review_repository;
pub mod pg_tour_repository;
pub mod pg_user_repository;
pub mod sql_features;

pub use pg_review_repository::PgReviewRepository;
pub use pg_tour_repository::PgTourRepository;
pub use pg_user_repository::PgUserRepository;
