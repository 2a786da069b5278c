//! # Error Handling Middleware
//!
//! Maps [`BookingError`] kinds to HTTP status codes and the JSON error
//! envelope `{"status": "error", "kind": ..., "message": ...}`.
//!
//! Storage and internal failures are logged here with their full detail;
//! the caller only ever sees a generic message for them.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use officehours_core::errors::{BookingError, ErrorKind};
use serde_json::json;
use tracing::{error, warn};

/// Application error wrapper that provides HTTP status code mapping
///
/// ```
/// use officehours_api::middleware::error_handling::AppError;
/// use officehours_core::errors::BookingError;
///
/// async fn handler() -> Result<(), AppError> {
///     Err(BookingError::not_found("Appointment doesn't exist").into())
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub BookingError);

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);

        match &self.0 {
            BookingError::Unavailable(report) => warn!(error = ?report, "Storage unavailable"),
            BookingError::Internal(err) => error!(error = %err, "Internal server error"),
            _ => {}
        }

        let body = Json(json!({
            "status": "error",
            "kind": kind,
            "message": self.0.public_message(),
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Storage-layer reports surface as `Unavailable`.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Unavailable(err))
    }
}

/// Malformed or non-JSON request bodies are the caller's fault.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(BookingError::invalid(rejection.body_text()))
    }
}

pub fn map_error(err: BookingError) -> Response {
    AppError(err).into_response()
}
