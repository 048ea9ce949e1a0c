//! Upload data model.
//!
//! Every value here is built per request from the inbound payload and dropped once the
//! response is sent; nothing is persisted by this service.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::MAX_SHOP_ID_LENGTH;

/// Where the bytes of a locally received file currently live.
#[derive(Debug, Clone)]
pub enum FileBody {
    /// Buffered in memory.
    Memory(Bytes),
    /// Buffered on disk; the file is owned (and removed) by the request that wrote it.
    Disk(PathBuf),
}

impl FileBody {
    /// Read the whole body.
    pub async fn read_all(&self) -> io::Result<Bytes> {
        match self {
            FileBody::Memory(bytes) => Ok(bytes.clone()),
            FileBody::Disk(path) => tokio::fs::read(path).await.map(Bytes::from),
        }
    }
}

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub body: FileBody,
}

impl LocalFile {
    pub fn in_memory(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size_bytes: data.len() as u64,
            body: FileBody::Memory(data),
        }
    }
}

/// What a single upload operation stores.
#[derive(Debug, Clone)]
pub enum UploadSource {
    RemoteUrl(String),
    LocalFile(LocalFile),
}

/// Where a file is stored.
///
/// `key_or_public_id` is a hint: the CDN backend uses it as the public id, the object
/// store ignores it in favour of a random key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDestination {
    pub shop_id: String,
    pub folder: String,
    pub key_or_public_id: String,
}

impl StorageDestination {
    /// Destination under `{folder_prefix}/{shop_id}`.
    pub fn for_shop(folder_prefix: &str, shop_id: &str, key_or_public_id: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.to_string(),
            folder: format!("{}/{}", folder_prefix.trim_end_matches('/'), shop_id),
            key_or_public_id: key_or_public_id.into(),
        }
    }
}

/// Shop ids are 1-64 chars of `[A-Za-z0-9_-]`; they become a folder name.
pub fn is_valid_shop_id(shop_id: &str) -> bool {
    !shop_id.is_empty()
        && shop_id.len() <= MAX_SHOP_ID_LENGTH
        && shop_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Result of a CDN upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CdnUpload {
    /// Secure URL of the stored original
    pub image_url: String,
    /// 100x100 jpg rendition, derived from the public id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    pub shop_id: String,
}

/// Result of an object-store upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    /// Time-limited GET URL for the private object
    pub signed_url: String,
    pub expires_in_seconds: u64,
    pub expires_at: DateTime<Utc>,
}

impl SignedUpload {
    /// Issue metadata for a URL signed at `issued_at`.
    pub fn issued(signed_url: String, issued_at: DateTime<Utc>, expires_in_seconds: u64) -> Self {
        let lifetime = Duration::seconds(i64::try_from(expires_in_seconds).unwrap_or(i64::MAX));
        Self {
            signed_url,
            expires_in_seconds,
            expires_at: issued_at
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whether the URL still grants access at `at`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at < self.expires_at
    }
}

/// Backend-specific result of one stored file. Callers must not assume a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum UploadResult {
    Cdn(CdnUpload),
    Signed(SignedUpload),
}

/// One result per input file, in input order.
pub type UploadBatch = Vec<UploadResult>;
