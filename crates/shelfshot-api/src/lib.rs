//! Shelfshot API Library
//!
//! HTTP surface for product image uploads: request validation, multipart buffering,
//! the upload coordinator, response envelopes and application setup.

mod api_doc;
mod handlers;
mod telemetry;
mod utils;

pub mod error;
pub mod middleware;
pub mod response;
pub mod services;
pub mod setup;
pub mod state;
pub mod validation;

// Re-exports
pub use error::{ErrorDetails, ErrorResponse, HttpAppError};
pub use response::SuccessResponse;
pub use services::upload::{UploadCoordinator, UploadOutcome, UploadRequest};
pub use state::AppState;
