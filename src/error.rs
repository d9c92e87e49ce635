//! Application error type and its translation into HTTP responses.
//!
//! Every handler, middleware and service returns [`AppError`]. Known failure
//! shapes coming from libraries (database constraint violations, validation
//! failures, token errors, malformed JSON bodies) are mapped onto client-safe
//! 4xx errors here, so handlers never translate errors inline.
//!
//! # Response Body
//!
//! ```json
//! { "status": "fail", "message": "No document found with that ID" }
//! ```
//!
//! `status` is `fail` for 4xx and `error` for 5xx. Internal errors are logged
//! and replaced by a generic message; the full report travels in the response
//! extensions so [`crate::api::middleware::error_report`] can expose it in
//! development mode.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

/// Message sent to clients in place of non-operational errors.
pub const GENERIC_MESSAGE: &str = "Something went wrong!";

/// Extracts `(column)=(value)` from a Postgres unique-violation detail.
static DUPLICATE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((?P<field>[^)]*)\)=\((?P<value>[^)]*)\)").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    #[error("{message}")]
    Forbidden { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    TooManyRequests { message: String, details: Value },
    /// Operational server-side failure: the message is safe to show.
    #[error("{message}")]
    Server { message: String, details: Value },
    /// Unexpected failure: logged and hidden from clients in production.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

/// Client-facing error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

/// Machine-readable error descriptor, also used in development responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub details: Value,
}

/// Full description of an error, attached to the response extensions.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub info: ErrorInfo,
    pub message: String,
    pub debug: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn too_many_requests(message: impl Into<String>, details: Value) -> Self {
        Self::TooManyRequests {
            message: message.into(),
            details,
        }
    }

    pub fn server(message: impl Into<String>, details: Value) -> Self {
        Self::Server {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// A value that cannot be cast to the type of `field`.
    pub fn cast(field: &str, value: &str) -> Self {
        Self::bad_request(
            format!("Invalid {field}: {value}"),
            json!({ "field": field, "value": value }),
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Server { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Unauthorized { .. } => "unauthorized",
            AppError::Forbidden { .. } => "forbidden",
            AppError::NotFound { .. } => "not_found",
            AppError::TooManyRequests { .. } => "rate_limited",
            AppError::Server { .. } => "server_error",
            AppError::Internal { .. } => "internal_error",
        }
    }

    pub fn details(&self) -> &Value {
        match self {
            AppError::Validation { details, .. }
            | AppError::Unauthorized { details, .. }
            | AppError::Forbidden { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::TooManyRequests { details, .. }
            | AppError::Server { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }

    /// Operational errors were raised on purpose and carry a client-safe message.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AppError::Internal { .. })
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            details: self.details().clone(),
        }
    }
}

/// `fail` for client errors, `error` for everything else.
pub fn status_label(status: StatusCode) -> &'static str {
    if status.is_client_error() {
        "fail"
    } else {
        "error"
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let report = ErrorReport {
            info: self.to_error_info(),
            message: self.to_string(),
            debug: format!("{self:?}"),
        };

        let message = if self.is_operational() {
            report.message.clone()
        } else {
            tracing::error!(
                code = report.info.code,
                details = %report.info.details,
                "{}",
                report.message
            );
            GENERIC_MESSAGE.to_string()
        };

        let body = ErrorBody {
            status: status_label(status),
            message,
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Translates database failures into client-facing errors.
///
/// | Failure                     | Result |
/// |-----------------------------|--------|
/// | unique violation            | 400 `Duplicate field value` |
/// | check constraint violation  | 400 `Invalid input data` |
/// | foreign key violation       | 400 `Invalid input data` |
/// | invalid text representation | 400 cast error |
/// | row not found               | 404 |
/// | anything else               | 500 |
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::RowNotFound = e {
        return AppError::not_found("No document found with that ID", json!({}));
    }

    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            let detail = db
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .unwrap_or_default();
            let (field, value) = duplicate_key(detail);
            return AppError::bad_request(
                format!("Duplicate field value: {value}. Please use another value!"),
                json!({ "constraint": db.constraint(), "field": field }),
            );
        }

        if db.is_check_violation() {
            let constraint = db.constraint().unwrap_or_default();
            return AppError::bad_request(
                format!("Invalid input data. {}", check_constraint_message(constraint)),
                json!({ "constraint": constraint }),
            );
        }

        if db.is_foreign_key_violation() {
            return AppError::bad_request(
                "Invalid input data. Referenced document does not exist",
                json!({ "constraint": db.constraint() }),
            );
        }

        if db.code().as_deref() == Some("22P02") {
            return AppError::bad_request(
                "Invalid input data",
                json!({ "reason": db.message() }),
            );
        }
    }

    AppError::internal("Database error", json!({ "reason": e.to_string() }))
}

/// Splits `Key (email)=(a@b.c) already exists.` into `("email", "a@b.c")`.
fn duplicate_key(detail: &str) -> (String, String) {
    DUPLICATE_KEY_REGEX
        .captures(detail)
        .map(|caps| (caps["field"].to_string(), caps["value"].to_string()))
        .unwrap_or_else(|| (String::new(), "unknown".to_string()))
}

fn check_constraint_message(constraint: &str) -> String {
    match constraint {
        "tours_name_length_check" => "A tour name must have between 10 and 40 characters".into(),
        "tours_difficulty_check" => "Difficulty is either: easy, medium, difficult".into(),
        "tours_duration_check" => "A tour must last at least one day".into(),
        "tours_max_group_size_check" => "A tour group must have at least one person".into(),
        "tours_price_check" => "A tour price cannot be negative".into(),
        "tours_ratings_average_check" => "Rating must be between 1.0 and 5.0".into(),
        "tours_price_discount_check" => "Discount price should be below regular price".into(),
        "tours_start_location_check" => "Start location needs both coordinates".into(),
        "reviews_rating_check" => "Rating must be between 1 and 5".into(),
        "reviews_review_length_check" => {
            "Review must contain between 10 and 300 characters".into()
        }
        "users_role_check" => "Role is either: user, guide, lead-guide, admin".into(),
        other => format!("Constraint {other} violated"),
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut messages: Vec<String> = field_errors
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    err.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid"))
                })
            })
            .collect();
        messages.sort();

        AppError::bad_request(
            format!("Invalid input data. {}", messages.join(". ")),
            serde_json::to_value(&errors).unwrap_or_default(),
        )
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::unauthorized(
                "Your token has expired! Please log in again.",
                json!({}),
            ),
            _ => AppError::unauthorized(
                "Invalid token. Please log in again!",
                json!({ "reason": e.to_string() }),
            ),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::internal("Password hashing failed", json!({ "reason": e.to_string() }))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text(), json!({}))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(rejection.body_text(), json!({}))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::bad_request(rejection.body_text(), json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 10, message = "A tour name must have at least 10 characters"))]
        name: String,
        #[validate(range(min = 1.0, max = 5.0))]
        rating: f64,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::bad_request("x", json!({})).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unauthorized("x", json!({})).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("x", json!({})).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found("x", json!({})).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::too_many_requests("x", json!({})).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::internal("x", json!({})).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_operational_flag() {
        assert!(AppError::server("mail down", json!({})).is_operational());
        assert!(!AppError::internal("boom", json!({})).is_operational());
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(StatusCode::NOT_FOUND), "fail");
        assert_eq!(status_label(StatusCode::INTERNAL_SERVER_ERROR), "error");
    }

    #[test]
    fn test_cast_message() {
        let err = AppError::cast("id", "abc");
        assert_eq!(err.to_string(), "Invalid id: abc");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_duplicate_key_parsing() {
        let (field, value) = duplicate_key("Key (email)=(test@example.com) already exists.");
        assert_eq!(field, "email");
        assert_eq!(value, "test@example.com");

        let (_, value) = duplicate_key("something else");
        assert_eq!(value, "unknown");
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let sample = Sample {
            name: "short".to_string(),
            rating: 9.0,
        };
        let err: AppError = sample.validate().unwrap_err().into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let message = err.to_string();
        assert!(message.starts_with("Invalid input data. "));
        assert!(message.contains("A tour name must have at least 10 characters"));
        assert!(message.contains("rating is invalid"));
    }

    #[test]
    fn test_row_not_found_is_404() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_hides_message() {
        let response = AppError::internal("secret detail", json!({})).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "secret detail");
    }
}
