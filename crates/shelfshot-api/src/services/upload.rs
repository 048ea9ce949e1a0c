//! Upload coordination
//!
//! One request runs through `validating -> dispatching -> uploading* -> assembling`,
//! ending in either an outcome or the first error. There is no partial success: once a
//! file fails, files after it are never sent and the whole request fails.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use serde::Serialize;
use shelfshot_core::{
    AppError, BackendKind, LocalFile, StorageDestination, UploadBatch, UploadPolicy, UploadResult,
    UploadSource,
};
use shelfshot_storage::{Backends, StorageBackend};
use utoipa::ToSchema;

use crate::validation::{validate_payload, validate_source_url, PayloadRequirement};

/// What a route asks the coordinator to store.
#[derive(Debug, Clone, Copy)]
pub enum UploadRequest<'a> {
    /// Let the backend store the object found at `url` under `public_id`.
    FromUrl { url: &'a str, public_id: &'a str },
    /// Exactly one file from `field`.
    SingleFile {
        field: &'static str,
        files: &'a [LocalFile],
    },
    /// One or more files from `field`, at most `max`.
    MultipleFiles {
        field: &'static str,
        files: &'a [LocalFile],
        max: usize,
    },
}

impl UploadRequest<'_> {
    fn requirement(&self) -> PayloadRequirement {
        match *self {
            UploadRequest::FromUrl { .. } => PayloadRequirement::None,
            UploadRequest::SingleFile { field, .. } => PayloadRequirement::SingleFile { field },
            UploadRequest::MultipleFiles { field, max, .. } => {
                PayloadRequirement::MultipleFiles { field, max }
            }
        }
    }

    fn files(&self) -> &[LocalFile] {
        match *self {
            UploadRequest::FromUrl { .. } => &[],
            UploadRequest::SingleFile { files, .. } => files,
            UploadRequest::MultipleFiles { files, .. } => files,
        }
    }
}

/// A single result, or one result per input file in input order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UploadOutcome {
    Single(UploadResult),
    Batch(Vec<UploadResult>),
}

/// Drives validation, backend dispatch and result assembly for upload routes.
#[derive(Clone)]
pub struct UploadCoordinator {
    cdn: Arc<dyn StorageBackend>,
    object_store: Arc<dyn StorageBackend>,
    policy: UploadPolicy,
    folder_prefix: String,
}

impl UploadCoordinator {
    pub fn new(backends: Backends, policy: UploadPolicy, folder_prefix: impl Into<String>) -> Self {
        Self {
            cdn: backends.cdn,
            object_store: backends.object_store,
            policy,
            folder_prefix: folder_prefix.into(),
        }
    }

    /// Kinds of the configured backends.
    pub fn backend_kinds(&self) -> [BackendKind; 2] {
        [self.cdn.kind(), self.object_store.kind()]
    }

    fn backend(&self, kind: BackendKind) -> &Arc<dyn StorageBackend> {
        match kind {
            BackendKind::Cdn => &self.cdn,
            BackendKind::ObjectStore => &self.object_store,
        }
    }

    /// Handle one upload request against the backend chosen by the route.
    pub async fn handle(
        &self,
        kind: BackendKind,
        shop_id: &str,
        request: UploadRequest<'_>,
    ) -> Result<UploadOutcome, AppError> {
        let start = Instant::now();
        let result = self.run(kind, shop_id, request).await;

        match &result {
            Ok(_) => tracing::info!(
                backend = %kind,
                shop_id = %shop_id,
                files = request.files().len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload request completed"
            ),
            Err(e) => tracing::warn!(
                state = "failed",
                backend = %kind,
                shop_id = %shop_id,
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload request failed"
            ),
        }

        result
    }

    async fn run(
        &self,
        kind: BackendKind,
        shop_id: &str,
        request: UploadRequest<'_>,
    ) -> Result<UploadOutcome, AppError> {
        tracing::debug!(state = "validating", backend = %kind, "Validating upload request");
        validate_payload(request.requirement(), request.files())?;
        if let UploadRequest::FromUrl { url, .. } = request {
            validate_source_url(url)?;
        }

        tracing::debug!(state = "dispatching", backend = %kind, "Dispatching upload");
        let backend = self.backend(kind);

        match request {
            UploadRequest::FromUrl { url, public_id } => {
                let destination = StorageDestination::for_shop(&self.folder_prefix, shop_id, public_id);
                tracing::debug!(state = "uploading", source = %url, "Storing remote object");
                let source = UploadSource::RemoteUrl(url.to_string());
                let result = backend.store(&source, &destination).await?;

                tracing::debug!(state = "assembling", "Assembling single result");
                Ok(UploadOutcome::Single(result))
            }
            UploadRequest::SingleFile { files, .. } => {
                let file = &files[0];
                let result = self.store_one(backend, shop_id, file, 0, 1).await?;

                tracing::debug!(state = "assembling", "Assembling single result");
                Ok(UploadOutcome::Single(result))
            }
            UploadRequest::MultipleFiles { files, .. } => {
                let batch = self.store_all(backend, shop_id, files).await?;

                tracing::debug!(state = "assembling", results = batch.len(), "Assembling batch");
                Ok(UploadOutcome::Batch(batch))
            }
        }
    }

    /// Store every file under the coordinator's policy; output order equals input order.
    async fn store_all(
        &self,
        backend: &Arc<dyn StorageBackend>,
        shop_id: &str,
        files: &[LocalFile],
    ) -> Result<UploadBatch, AppError> {
        let total = files.len();
        match self.policy {
            UploadPolicy::Sequential => {
                let mut batch = Vec::with_capacity(total);
                for (index, file) in files.iter().enumerate() {
                    batch.push(self.store_one(backend, shop_id, file, index, total).await?);
                }
                Ok(batch)
            }
            UploadPolicy::Concurrent { limit } => {
                // Built up front so the handler future stays Send; nothing runs until
                // `buffered` polls it, so files past a failure are never dispatched.
                let uploads: Vec<_> = files
                    .iter()
                    .enumerate()
                    .map(|(index, file)| self.store_one(backend, shop_id, file, index, total).boxed())
                    .collect();
                stream::iter(uploads)
                    .buffered(limit.max(1))
                    .try_collect()
                    .await
            }
        }
    }

    async fn store_one(
        &self,
        backend: &Arc<dyn StorageBackend>,
        shop_id: &str,
        file: &LocalFile,
        index: usize,
        total: usize,
    ) -> Result<UploadResult, AppError> {
        let destination =
            StorageDestination::for_shop(&self.folder_prefix, shop_id, file.original_name.clone());

        tracing::debug!(
            state = "uploading",
            index,
            total,
            filename = %file.original_name,
            size_bytes = file.size_bytes,
            "Uploading file"
        );

        let source = UploadSource::LocalFile(file.clone());
        backend
            .store(&source, &destination)
            .await
            .map_err(|e| {
                tracing::warn!(index, total, filename = %file.original_name, error = %e, "File upload failed");
                AppError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use shelfshot_core::{CdnUpload, ErrorMetadata};
    use shelfshot_storage::{StorageError, StorageResult};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers with the file name; sleeps longer for earlier files so completion order
    /// is the reverse of input order. Fails on the file named `fail_on`.
    struct SlowBackend {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl SlowBackend {
        fn new(fail_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_on,
            })
        }
    }

    #[async_trait]
    impl StorageBackend for SlowBackend {
        async fn store_from_url(
            &self,
            remote_url: &str,
            destination: &StorageDestination,
        ) -> StorageResult<UploadResult> {
            self.calls.lock().unwrap().push(remote_url.to_string());
            Ok(UploadResult::Cdn(CdnUpload {
                image_url: remote_url.to_string(),
                thumb_url: None,
                shop_id: destination.shop_id.clone(),
            }))
        }

        async fn store_from_file(
            &self,
            file: &LocalFile,
            destination: &StorageDestination,
        ) -> StorageResult<UploadResult> {
            self.calls.lock().unwrap().push(file.original_name.clone());
            let delay: u64 = file.original_name.trim_end_matches(".png").parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 - delay * 10)).await;
            if self.fail_on == Some(file.original_name.as_str()) {
                return Err(StorageError::Unavailable("provider down".into()));
            }
            Ok(UploadResult::Cdn(CdnUpload {
                image_url: format!("https://cdn.test/{}", destination.key_or_public_id),
                thumb_url: None,
                shop_id: destination.shop_id.clone(),
            }))
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Cdn
        }
    }

    fn coordinator(backend: Arc<SlowBackend>, policy: UploadPolicy) -> UploadCoordinator {
        let backends = Backends {
            cdn: backend.clone(),
            object_store: backend,
        };
        UploadCoordinator::new(backends, policy, "products")
    }

    fn files(n: usize) -> Vec<LocalFile> {
        (0..n)
            .map(|i| LocalFile::in_memory(format!("{i}.png"), "image/png", Bytes::from_static(b"x")))
            .collect()
    }

    fn urls(outcome: UploadOutcome) -> Vec<String> {
        let UploadOutcome::Batch(batch) = outcome else {
            panic!("expected a batch");
        };
        batch
            .into_iter()
            .map(|r| match r {
                UploadResult::Cdn(c) => c.image_url,
                UploadResult::Signed(s) => s.signed_url,
            })
            .collect()
    }

    #[tokio::test]
    async fn sequential_batch_keeps_input_order() {
        let backend = SlowBackend::new(None);
        let coordinator = coordinator(backend.clone(), UploadPolicy::Sequential);
        let files = files(3);

        let outcome = coordinator
            .handle(
                BackendKind::Cdn,
                "0000",
                UploadRequest::MultipleFiles { field: "files", files: &files, max: 10 },
            )
            .await
            .unwrap();

        assert_eq!(
            urls(outcome),
            vec!["https://cdn.test/0.png", "https://cdn.test/1.png", "https://cdn.test/2.png"]
        );
        assert_eq!(*backend.calls.lock().unwrap(), vec!["0.png", "1.png", "2.png"]);
    }

    #[tokio::test]
    async fn sequential_batch_stops_at_first_failure() {
        let backend = SlowBackend::new(Some("1.png"));
        let coordinator = coordinator(backend.clone(), UploadPolicy::Sequential);
        let files = files(4);

        let err = coordinator
            .handle(
                BackendKind::Cdn,
                "0000",
                UploadRequest::MultipleFiles { field: "files", files: &files, max: 10 },
            )
            .await
            .unwrap_err();

        assert_eq!(err.http_status_code(), 502);
        assert_eq!(*backend.calls.lock().unwrap(), vec!["0.png", "1.png"]);
    }

    #[tokio::test]
    async fn concurrent_batch_keeps_input_order() {
        let backend = SlowBackend::new(None);
        let coordinator = coordinator(backend.clone(), UploadPolicy::Concurrent { limit: 3 });
        let files = files(3);

        let outcome = coordinator
            .handle(
                BackendKind::Cdn,
                "0000",
                UploadRequest::MultipleFiles { field: "files", files: &files, max: 10 },
            )
            .await
            .unwrap();

        assert_eq!(
            urls(outcome),
            vec!["https://cdn.test/0.png", "https://cdn.test/1.png", "https://cdn.test/2.png"]
        );
    }

    #[tokio::test]
    async fn concurrent_batch_never_starts_files_beyond_the_window_after_failure() {
        let backend = SlowBackend::new(Some("0.png"));
        let coordinator = coordinator(backend.clone(), UploadPolicy::Concurrent { limit: 2 });
        let files = files(5);

        let result = coordinator
            .handle(
                BackendKind::Cdn,
                "0000",
                UploadRequest::MultipleFiles { field: "files", files: &files, max: 10 },
            )
            .await;

        assert!(result.is_err());
        let calls = backend.calls.lock().unwrap().clone();
        assert!(!calls.contains(&"4.png".to_string()));
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_backend_call() {
        let backend = SlowBackend::new(None);
        let coordinator = coordinator(backend.clone(), UploadPolicy::Sequential);

        let err = coordinator
            .handle(
                BackendKind::Cdn,
                "0000",
                UploadRequest::SingleFile { field: "file", files: &[] },
            )
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "MISSING_PAYLOAD");
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn url_request_builds_shop_destination() {
        let backend = SlowBackend::new(None);
        let coordinator = coordinator(backend.clone(), UploadPolicy::Sequential);

        let outcome = coordinator
            .handle(
                BackendKind::Cdn,
                "shop-7",
                UploadRequest::FromUrl { url: "https://example.com/shoes.jpg", public_id: "shoes" },
            )
            .await
            .unwrap();

        let UploadOutcome::Single(UploadResult::Cdn(upload)) = outcome else {
            panic!("expected a single CDN result");
        };
        assert_eq!(upload.shop_id, "shop-7");
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn batch_future_is_send_under_either_policy() {
        let files = files(2);
        for policy in [UploadPolicy::Sequential, UploadPolicy::Concurrent { limit: 2 }] {
            let coordinator = coordinator(SlowBackend::new(None), policy);
            let upload = coordinator.handle(
                BackendKind::Cdn,
                "0000",
                UploadRequest::MultipleFiles { field: "files", files: &files, max: 10 },
            );
            assert_send(&upload);
        }
    }
}
