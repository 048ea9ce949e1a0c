//! Response middleware

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, response::Response, Json};

use crate::error::ErrorDetails;
use crate::state::AppState;

/// Re-render error responses with their [`ErrorDetails`] when the state allows it.
///
/// Status and headers are kept; only the JSON body changes. In production the extension
/// is dropped and the safe body goes out untouched.
pub async fn render_error_details(State(state): State<Arc<AppState>>, mut response: Response) -> Response {
    let Some(ErrorDetails(detailed)) = response.extensions_mut().remove::<ErrorDetails>() else {
        return response;
    };
    if !state.expose_error_details {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let (body_parts, body) = Json(detailed).into_response().into_parts();
    if let Some(content_type) = body_parts.headers.get(axum::http::header::CONTENT_TYPE) {
        parts.headers.insert(axum::http::header::CONTENT_TYPE, content_type.clone());
    }
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, body)
}
