//! Development-mode error details.
//!
//! [`AppError`](crate::error::AppError) responses carry an
//! [`ErrorReport`] in their extensions. In development this middleware
//! rewrites the body to include it; in production the report is dropped and
//! the client-safe body is sent as is.

use axum::{
    Json,
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{ErrorInfo, ErrorReport, status_label};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct DevErrorBody {
    status: &'static str,
    message: String,
    error: ErrorInfo,
    stack: String,
}

pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };
    if !st.run_mode.is_development() {
        return response;
    }

    let status = response.status();
    let body = DevErrorBody {
        status: status_label(status),
        message: report.message,
        error: report.info,
        stack: report.debug,
    };
    let mut rewritten = (status, Json(body)).into_response();
    for (name, value) in response.headers() {
        if name != CONTENT_TYPE && name != CONTENT_LENGTH {
            rewritten.headers_mut().append(name.clone(), value.clone());
        }
    }
    rewritten
}
