//! Response for unmatched routes.

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// `404 Can't find <path> on this server!`
pub async fn not_found(uri: Uri) -> AppError {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());
    AppError::not_found(
        format!("Can't find {target} on this server!"),
        json!({ "path": uri.path() }),
    )
}
