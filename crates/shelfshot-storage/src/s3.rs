//! Object-store backend (S3 and S3-compatible buckets)
//!
//! Objects are private: every stored file is answered with a time-limited signed GET
//! URL rather than a public one. Keys are random, so the destination folder and the
//! original file name never reach the bucket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use shelfshot_core::{
    BackendKind, Clock, LocalFile, ObjectStoreConfig, SignedUpload, StorageDestination,
    SystemClock, UploadResult,
};

use crate::keys::generate_object_key;
use crate::traits::{StorageBackend, StorageError, StorageResult};

/// Issues signed GET URLs for stored keys.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn signed_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;
}

#[async_trait]
impl UrlSigner for AmazonS3 {
    async fn signed_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let location = Path::from(key);
        self.signed_url(Method::GET, &location, expires_in)
            .await
            .map(|url| url.to_string())
            .map_err(map_object_store_error)
    }
}

fn map_object_store_error(err: ObjectStoreError) -> StorageError {
    match err {
        ObjectStoreError::NotFound { .. } => StorageError::Rejected {
            status: 404,
            message: err.to_string(),
        },
        ObjectStoreError::Precondition { .. } | ObjectStoreError::AlreadyExists { .. } => {
            StorageError::Rejected {
                status: 412,
                message: err.to_string(),
            }
        }
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::Rejected {
                status: 403,
                message: err.to_string(),
            }
        }
        other => StorageError::Unavailable(other.to_string()),
    }
}

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn UrlSigner>,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
    bucket: String,
    expires_in_seconds: u64,
}

impl S3Storage {
    /// Assemble from parts; tests pass an in-memory store and a fake signer.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        signer: Arc<dyn UrlSigner>,
        http: reqwest::Client,
        bucket: impl Into<String>,
        expires_in_seconds: u64,
    ) -> Self {
        Self {
            store,
            signer,
            clock: Arc::new(SystemClock),
            http,
            bucket: bucket.into(),
            expires_in_seconds,
        }
    }

    /// Connect to the configured bucket with explicit credentials.
    ///
    /// `endpoint` targets S3-compatible providers (e.g. "http://localhost:9000" for MinIO).
    pub fn from_config(config: &ObjectStoreConfig, http: reqwest::Client) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_region(config.region.clone())
            .with_bucket_name(config.bucket.clone())
            .with_access_key_id(config.access_key_id.clone())
            .with_secret_access_key(config.secret_access_key.clone());

        if let Some(ref endpoint) = config.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let s3 = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self::new(
            Arc::new(s3.clone()),
            Arc::new(s3),
            http,
            config.bucket.clone(),
            config.signed_url_expiry_secs,
        ))
    }

    /// Replace the clock used to compute `expiresAt`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn put_and_sign(&self, data: Bytes, content_type: &str) -> StorageResult<UploadResult> {
        let key = generate_object_key();
        let location = Path::from(key.as_str());
        let size = data.len() as u64;

        let mut attributes = Attributes::new();
        if !content_type.is_empty() {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = Instant::now();
        self.store
            .put_opts(&location, PutPayload::from(data), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                map_object_store_error(e)
            })?;

        let issued_at = self.clock.now();
        let signed_url = self
            .signer
            .signed_get_url(&key, Duration::from_secs(self.expires_in_seconds))
            .await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            expires_in_seconds = self.expires_in_seconds,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(UploadResult::Signed(SignedUpload::issued(
            signed_url,
            issued_at,
            self.expires_in_seconds,
        )))
    }

    /// Fetch a remote object; buckets cannot pull URLs themselves.
    async fn download(&self, remote_url: &str) -> StorageResult<(Bytes, String)> {
        let response = self
            .http
            .get(remote_url)
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to fetch {}: {}", remote_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Rejected {
                status: if status.is_client_error() {
                    status.as_u16()
                } else {
                    400
                },
                message: format!("Source URL responded with status {}", status),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to read {}: {}", remote_url, e)))?;

        Ok((data, content_type))
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn store_from_url(
        &self,
        remote_url: &str,
        _destination: &StorageDestination,
    ) -> StorageResult<UploadResult> {
        let (data, content_type) = self.download(remote_url).await?;
        self.put_and_sign(data, &content_type).await
    }

    async fn store_from_file(
        &self,
        file: &LocalFile,
        _destination: &StorageDestination,
    ) -> StorageResult<UploadResult> {
        let data = file.body.read_all().await?;
        self.put_and_sign(data, &file.mime_type).await
    }

    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use object_store::memory::InMemory;
    use object_store::ObjectStoreExt;
    use shelfshot_core::FixedClock;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Signs by echoing the key and lifetime, recording every key it saw.
    #[derive(Default)]
    struct FakeSigner {
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UrlSigner for FakeSigner {
        async fn signed_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(format!(
                "https://bucket.test/{}?X-Amz-Expires={}",
                key,
                expires_in.as_secs()
            ))
        }
    }

    struct Fixture {
        storage: S3Storage,
        store: Arc<InMemory>,
        signer: Arc<FakeSigner>,
        issued_at: chrono::DateTime<Utc>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemory::new());
        let signer = Arc::new(FakeSigner::default());
        let issued_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let storage = S3Storage::new(
            store.clone(),
            signer.clone(),
            reqwest::Client::new(),
            "product-images",
            3600,
        )
        .with_clock(Arc::new(FixedClock(issued_at)));
        Fixture {
            storage,
            store,
            signer,
            issued_at,
        }
    }

    fn destination() -> StorageDestination {
        StorageDestination::for_shop("products", "0000", "shoe.png")
    }

    #[tokio::test]
    async fn stores_under_random_key_and_signs_for_configured_lifetime() {
        let f = fixture();
        let file = LocalFile::in_memory("shoe.png", "image/png", Bytes::from_static(b"png"));

        let result = f.storage.store_from_file(&file, &destination()).await.unwrap();
        let UploadResult::Signed(signed) = result else {
            panic!("expected a signed result");
        };

        let keys = f.signer.keys.lock().unwrap().clone();
        assert_eq!(keys.len(), 1);
        let key = &keys[0];
        assert_eq!(key.len(), 32);
        assert!(!key.contains("shoe"));
        assert!(!key.contains("products"));

        let stored = f.store.get(&Path::from(key.as_str())).await.unwrap();
        assert_eq!(stored.bytes().await.unwrap(), Bytes::from_static(b"png"));

        assert_eq!(signed.expires_in_seconds, 3600);
        assert!(signed.signed_url.contains(key.as_str()));
        assert!(signed.signed_url.contains("X-Amz-Expires=3600"));
        assert_eq!(signed.expires_at, f.issued_at + ChronoDuration::seconds(3600));
    }

    #[tokio::test]
    async fn signed_url_is_not_valid_after_expiry() {
        let f = fixture();
        let file = LocalFile::in_memory("shoe.png", "image/png", Bytes::from_static(b"png"));

        let UploadResult::Signed(signed) =
            f.storage.store_from_file(&file, &destination()).await.unwrap()
        else {
            panic!("expected a signed result");
        };

        assert!(signed.is_valid_at(f.issued_at + ChronoDuration::seconds(3599)));
        assert!(!signed.is_valid_at(f.issued_at + ChronoDuration::seconds(3600)));
    }

    #[tokio::test]
    async fn same_file_name_twice_gets_distinct_keys() {
        let f = fixture();
        let file = LocalFile::in_memory("shoe.png", "image/png", Bytes::from_static(b"png"));

        f.storage.store_from_file(&file, &destination()).await.unwrap();
        f.storage.store_from_file(&file, &destination()).await.unwrap();

        let keys = f.signer.keys.lock().unwrap().clone();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn url_source_is_downloaded_then_stored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shoes.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(b"jpeg-bytes".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture();
        let url = format!("{}/shoes.jpg", server.uri());
        let result = f.storage.store_from_url(&url, &destination()).await.unwrap();
        assert!(matches!(result, UploadResult::Signed(_)));

        let key = f.signer.keys.lock().unwrap()[0].clone();
        let stored = f.store.get(&Path::from(key.as_str())).await.unwrap();
        assert_eq!(stored.bytes().await.unwrap(), Bytes::from_static(b"jpeg-bytes"));
    }

    #[tokio::test]
    async fn missing_url_source_is_rejected_without_storing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let f = fixture();
        let url = format!("{}/gone.jpg", server.uri());
        let err = f.storage.store_from_url(&url, &destination()).await.unwrap_err();

        assert!(matches!(err, StorageError::Rejected { status: 404, .. }));
        assert!(f.signer.keys.lock().unwrap().is_empty());
    }

    #[test]
    fn object_store_errors_map_to_rejected_or_unavailable() {
        let not_found = ObjectStoreError::NotFound {
            path: "k".to_string(),
            source: "missing".into(),
        };
        assert!(matches!(
            map_object_store_error(not_found),
            StorageError::Rejected { status: 404, .. }
        ));

        let generic = ObjectStoreError::Generic {
            store: "S3",
            source: "connection reset".into(),
        };
        assert!(matches!(
            map_object_store_error(generic),
            StorageError::Unavailable(_)
        ));
    }

    #[test]
    fn reports_object_store_kind() {
        assert_eq!(fixture().storage.kind(), BackendKind::ObjectStore);
    }
}
