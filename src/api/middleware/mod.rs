//! HTTP middleware for request processing and protection.
//!
//! Provides session authentication, role checks, rate limiting, request
//! tracing and development error reports.

pub mod auth;
pub mod error_report;
pub mod rate_limit;
pub mod tracing;
