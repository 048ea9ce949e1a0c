//! Success envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Message returned with every successful upload.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Upload image successfully";

/// `{ "message", "metadata" }` with HTTP 200.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse<T> {
    pub message: String,
    pub metadata: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, metadata: T) -> Self {
        Self {
            message: message.into(),
            metadata,
        }
    }

    /// Envelope for a completed upload.
    pub fn uploaded(metadata: T) -> Self {
        Self::new(UPLOAD_SUCCESS_MESSAGE, metadata)
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
