//! Storage abstraction trait
//!
//! This module defines the capability interface every upload backend implements.

use async_trait::async_trait;
use shelfshot_core::{
    AppError, BackendKind, LocalFile, StorageDestination, UploadResult, UploadSource,
};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The provider answered and refused the request (bad credentials, malformed input, ...).
    #[error("Provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider could not be reached or failed on its side (5xx, timeout, reset).
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rejected { status, message } => {
                AppError::BackendRejected { status, message }
            }
            StorageError::Unavailable(message) => AppError::BackendUnavailable(message),
            StorageError::InvalidKey(message) => AppError::InvalidInput(message),
            StorageError::Io(e) => AppError::from(e),
            StorageError::Config(message) => {
                AppError::Internal(format!("Storage configuration error: {}", message))
            }
        }
    }
}

/// Storage capability interface
///
/// A backend stores either a remote URL or a locally received file under a
/// [`StorageDestination`] and answers with its own [`UploadResult`] shape. Callers must
/// not assume which shape comes back.
///
/// Implementations make exactly one provider attempt per call: no retries, no caching.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store the object found at `remote_url`.
    async fn store_from_url(
        &self,
        remote_url: &str,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResult>;

    /// Store a file received from the client.
    async fn store_from_file(
        &self,
        file: &LocalFile,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResult>;

    /// Store `source`, whichever kind it is.
    async fn store(
        &self,
        source: &UploadSource,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResult> {
        match source {
            UploadSource::RemoteUrl(url) => self.store_from_url(url, destination).await,
            UploadSource::LocalFile(file) => self.store_from_file(file, destination).await,
        }
    }

    /// Which provider this is
    fn kind(&self) -> BackendKind;
}
