//! Shelfshot Core Library
//!
//! This crate provides the upload data model, error types, configuration, and the
//! CDN transformation URL builder shared by the storage and API crates.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod transform_url;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CdnConfig, Config, ObjectStoreConfig, UploadConfig, UploadPolicy};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    is_valid_shop_id, CdnUpload, FileBody, LocalFile, SignedUpload, StorageDestination, UploadBatch,
    UploadResult, UploadSource,
};
pub use storage_types::BackendKind;
pub use transform_url::ImageTransformUrlBuilder;
