//! Helpers shared across layers.
//!
//! - [`slug`] - URL slugs for tour names
//! - [`jwt`] - Session token signing and verification
//! - [`password`] - bcrypt hashing on the blocking pool
//! - [`reset_token`] - Password reset token generation and hashing
//! - [`cookie`] - The `jwt` session cookie

pub mod cookie;
pub mod jwt;
pub mod password;
pub mod reset_token;
pub mod slug;
