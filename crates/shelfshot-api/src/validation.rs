//! Request validation
//!
//! Pure presence/shape checks that run before any backend is touched. Content checks
//! (image format, dimensions) are left to the providers.

use axum::http::Uri;
use shelfshot_core::constants::MAX_SHOP_ID_LENGTH;
use shelfshot_core::{is_valid_shop_id, AppError, LocalFile};

/// Payload shape an upload route expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRequirement {
    /// Nothing from the body; the source URL is a parameter or a server-side default.
    None,
    /// Exactly one file in `field`.
    SingleFile { field: &'static str },
    /// Between one and `max` files in `field`.
    MultipleFiles { field: &'static str, max: usize },
}

/// Check that the received files match `requirement`.
pub fn validate_payload(requirement: PayloadRequirement, files: &[LocalFile]) -> Result<(), AppError> {
    match requirement {
        PayloadRequirement::None => Ok(()),
        PayloadRequirement::SingleFile { field } => match files.len() {
            0 => Err(AppError::MissingPayload(format!(
                "No file provided in field '{}'",
                field
            ))),
            1 => Ok(()),
            n => Err(AppError::InvalidInput(format!(
                "Expected exactly one file in field '{}', got {}",
                field, n
            ))),
        },
        PayloadRequirement::MultipleFiles { field, max } => {
            if files.is_empty() {
                return Err(AppError::MissingPayload(format!(
                    "No files provided in field '{}'",
                    field
                )));
            }
            if files.len() > max {
                return Err(AppError::InvalidInput(format!(
                    "Too many files: {} (maximum {} per request)",
                    files.len(),
                    max
                )));
            }
            Ok(())
        }
    }
}

/// Shop ids are 1-64 chars of `[A-Za-z0-9_-]`; they become a folder name.
pub fn validate_shop_id(shop_id: &str) -> Result<(), AppError> {
    if !is_valid_shop_id(shop_id) {
        return Err(AppError::InvalidInput(format!(
            "Invalid shop_id '{}': expected 1-{} characters of letters, digits, '-' or '_'",
            shop_id, MAX_SHOP_ID_LENGTH
        )));
    }
    Ok(())
}

/// Source URLs must be absolute http(s) URLs with a host.
pub fn validate_source_url(url: &str) -> Result<(), AppError> {
    let uri: Uri = url
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid source URL '{}'", url)))?;

    let scheme_ok = matches!(uri.scheme_str(), Some("http") | Some("https"));
    if !scheme_ok || uri.host().map_or(true, str::is_empty) {
        return Err(AppError::InvalidInput(format!(
            "Source URL must be an absolute http(s) URL: '{}'",
            url
        )));
    }
    Ok(())
}
