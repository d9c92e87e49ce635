//! Password hashing with bcrypt.
//!
//! Hashing is CPU-bound, so both operations run on the blocking thread pool.

use serde_json::json;

use crate::error::AppError;

/// Adaptive cost factor.
pub const BCRYPT_COST: u32 = 12;

pub async fn hash_password(plain: &str) -> Result<String, AppError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, BCRYPT_COST))
        .await
        .map_err(|e| AppError::internal("Hashing task failed", json!({ "reason": e.to_string() })))?
        .map_err(AppError::from)
}

/// Returns false for a wrong password and for a malformed stored hash.
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, AppError> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::internal("Hashing task failed", json!({ "reason": e.to_string() })))
}

/// True if `value` already looks like a bcrypt hash.
pub fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && value.starts_with("$2")
}
