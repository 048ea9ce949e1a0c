//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that converts into
//! `AppError` (storage errors, multipart errors, anyhow) becomes an `HttpAppError` and
//! renders as `{ "message", "code", "status" }` with the status from `ErrorMetadata`.
//!
//! The rendered body never carries details. The detailed body rides along as an
//! [`ErrorDetails`] response extension, and `middleware::render_error_details` swaps it in
//! when the running environment allows it.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shelfshot_core::{AppError, ErrorMetadata, LogLevel};
use shelfshot_storage::StorageError;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Client-facing message
    pub message: String,
    /// Machine-readable error code (e.g. "MISSING_PAYLOAD")
    pub code: String,
    /// HTTP status, repeated in the body
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from shelfshot-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        let app = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!("Request body too large: {}", err.body_text()))
        } else {
            AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let status = error.http_status_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, status, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, status, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type = error_type,
                status,
                "Request failed"
            );
        }
    }
}

/// Detailed error body attached to every error response.
#[derive(Debug, Clone)]
pub struct ErrorDetails(pub ErrorResponse);

impl ErrorResponse {
    /// Body for `error`; details only when `expose_details` and the error is not sensitive.
    pub fn from_app_error(error: &AppError, expose_details: bool) -> Self {
        let show = expose_details && !error.is_sensitive();
        Self {
            message: error.client_message(),
            code: error.error_code().to_string(),
            status: error.http_status_code(),
            details: show.then(|| error.detailed_message()),
            error_type: show.then(|| error.error_type().to_string()),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse::from_app_error(app_error, false);
        let detailed = ErrorResponse::from_app_error(app_error, true);

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorDetails(detailed));
        response
    }
}
