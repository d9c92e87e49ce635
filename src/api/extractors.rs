//! Request extractors whose rejections go through [`AppError`].
//!
//! axum's own extractors answer malformed input with plain-text bodies. The
//! wrappers here keep every failure in the JSON error format.

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Raw query pairs in request order. Repeated keys are kept.
#[derive(Debug, Deserialize, FromRequestParts)]
#[serde(transparent)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryPairs(pub Vec<(String, String)>);

/// Parses a document id taken from the URL.
///
/// # Errors
///
/// Returns the cast error `Invalid id: <raw>` for anything that is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::cast("id", raw))
}
