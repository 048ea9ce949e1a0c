//! Shelfshot Storage Library
//!
//! Storage backends behind one capability interface, [`StorageBackend`]:
//!
//! - **CDN** ([`CdnStorage`]): stores under a caller-chosen public id inside
//!   `{prefix}/{shop_id}` and derives a 100x100 jpg thumbnail URL from that id.
//! - **Object store** ([`S3Storage`]): stores under a random 128-bit hex key
//!   in a private bucket and answers with a time-limited signed GET URL.
//!
//! Each store call is a single attempt; provider refusals and outages are reported as
//! distinct [`StorageError`] variants so the HTTP layer can choose the status code.

pub mod cdn;
pub mod factory;
pub mod keys;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use cdn::CdnStorage;
pub use factory::{create_backends, Backends};
pub use s3::{S3Storage, UrlSigner};
pub use shelfshot_core::BackendKind;
pub use traits::{StorageBackend, StorageError, StorageResult};
