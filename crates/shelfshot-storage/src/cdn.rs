//! CDN storage backend (Cloudinary-compatible upload API)
//!
//! Uploads go to `POST {api_base}/v1_1/{cloud}/image/upload` as a signed multipart form.
//! The provider either receives the bytes or fetches `file` itself when it is a URL.
//! Thumbnails are never uploaded: their URL is derived from the returned public id.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use shelfshot_core::{
    BackendKind, CdnConfig, CdnUpload, Clock, FileBody, ImageTransformUrlBuilder, LocalFile,
    StorageDestination, SystemClock, UploadResult,
};
use tokio_util::io::ReaderStream;

use crate::keys::{public_id_from_filename, validate_key};
use crate::traits::{StorageBackend, StorageError, StorageResult};

/// Successful upload answer; only the fields this service reads.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signature over upload parameters: SHA-1 hex of the `&`-joined, key-sorted
/// `key=value` pairs immediately followed by the API secret.
pub fn api_signature(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// What is sent as the `file` field.
enum UploadFile<'a> {
    Remote(&'a str),
    Local(&'a LocalFile),
}

/// Multipart part for a received file. Disk-buffered files are streamed from disk.
async fn file_part(file: &LocalFile) -> StorageResult<Part> {
    let part = match &file.body {
        FileBody::Memory(data) => Part::bytes(data.to_vec()),
        FileBody::Disk(path) => {
            let reader = tokio::fs::File::open(path).await?;
            Part::stream_with_length(
                reqwest::Body::wrap_stream(ReaderStream::new(reader)),
                file.size_bytes,
            )
        }
    };
    Ok(part.file_name(file.original_name.clone()))
}

/// CDN storage implementation
#[derive(Clone)]
pub struct CdnStorage {
    http: reqwest::Client,
    config: CdnConfig,
    clock: Arc<dyn Clock>,
}

impl CdnStorage {
    pub fn new(config: CdnConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for request timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn upload_endpoint(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// 100x100 jpg rendition of `public_id`.
    pub fn thumbnail_url(&self, public_id: &str) -> String {
        ImageTransformUrlBuilder::thumbnail().build(
            &self.config.delivery_base_url,
            &self.config.cloud_name,
            public_id,
        )
    }

    async fn upload(
        &self,
        file: UploadFile<'_>,
        public_id: &str,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResponse> {
        validate_key(&destination.folder)?;

        let timestamp = self.clock.now().timestamp().to_string();
        let mut signed = BTreeMap::new();
        signed.insert("folder", destination.folder.clone());
        signed.insert("public_id", public_id.to_string());
        signed.insert("timestamp", timestamp.clone());
        let signature = api_signature(&signed, &self.config.api_secret);

        let form = Form::new()
            .text("public_id", public_id.to_string())
            .text("folder", destination.folder.clone())
            .text("timestamp", timestamp)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        let form = match file {
            UploadFile::Remote(url) => form.text("file", url.to_string()),
            UploadFile::Local(local) => form.part("file", file_part(local).await?),
        };

        let start = Instant::now();
        let response = self
            .http
            .post(self.upload_endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    public_id = %public_id,
                    folder = %destination.folder,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "CDN upload request failed"
                );
                StorageError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status.is_client_error() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("request rejected")
                    .to_string(),
            };
            tracing::warn!(
                status = status.as_u16(),
                public_id = %public_id,
                folder = %destination.folder,
                message = %message,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "CDN rejected upload"
            );
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                public_id = %public_id,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "CDN upload failed"
            );
            return Err(StorageError::Unavailable(format!(
                "CDN responded with status {}",
                status
            )));
        }

        let body = response.json::<UploadResponse>().await.map_err(|e| {
            StorageError::Unavailable(format!("Unreadable CDN upload response: {}", e))
        })?;

        tracing::info!(
            public_id = %body.public_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "CDN upload successful"
        );

        Ok(body)
    }

    fn public_id_for(&self, hint: &str, fallback: &str) -> StorageResult<String> {
        if hint.trim().is_empty() {
            public_id_from_filename(fallback)
        } else {
            public_id_from_filename(hint)
        }
    }
}

#[async_trait]
impl StorageBackend for CdnStorage {
    async fn store_from_url(
        &self,
        remote_url: &str,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResult> {
        let public_id = self.public_id_for(&destination.key_or_public_id, remote_url)?;
        let uploaded = self
            .upload(UploadFile::Remote(remote_url), &public_id, destination)
            .await?;

        Ok(UploadResult::Cdn(CdnUpload {
            image_url: uploaded.secure_url,
            thumb_url: None,
            shop_id: destination.shop_id.clone(),
        }))
    }

    async fn store_from_file(
        &self,
        file: &LocalFile,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResult> {
        let public_id = self.public_id_for(&destination.key_or_public_id, &file.original_name)?;
        tracing::debug!(
            public_id = %public_id,
            size_bytes = file.size_bytes,
            "Uploading file to CDN"
        );

        let uploaded = self
            .upload(UploadFile::Local(file), &public_id, destination)
            .await?;

        Ok(UploadResult::Cdn(CdnUpload {
            thumb_url: Some(self.thumbnail_url(&uploaded.public_id)),
            image_url: uploaded.secure_url,
            shop_id: destination.shop_id.clone(),
        }))
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Cdn
    }
}
