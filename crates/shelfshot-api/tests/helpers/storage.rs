//! Recording fake storage backends.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shelfshot_core::{
    BackendKind, CdnUpload, FileBody, LocalFile, SignedUpload, StorageDestination, UploadResult,
};
use shelfshot_storage::{StorageBackend, StorageError, StorageResult};
use std::path::PathBuf;
use std::sync::Mutex;

/// One call seen by a [`RecordingBackend`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Remote URL, or the original file name
    pub source: String,
    pub shop_id: String,
    pub folder: String,
    pub key_or_public_id: String,
    /// Temp file backing a disk-buffered upload, and whether it existed during the call
    pub disk_path: Option<(PathBuf, bool)>,
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Rejected(u16),
    Unavailable,
}

/// Fake backend that records every call and can fail on the n-th one (0-based).
pub struct RecordingBackend {
    kind: BackendKind,
    fail_at: Option<(usize, Failure)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingBackend {
    pub fn cdn() -> Self {
        Self {
            kind: BackendKind::Cdn,
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn bucket() -> Self {
        Self {
            kind: BackendKind::ObjectStore,
            ..Self::cdn()
        }
    }

    pub fn failing_at(mut self, call: usize, failure: Failure) -> Self {
        self.fail_at = Some((call, failure));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sources(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.source).collect()
    }

    fn record(&self, call: RecordedCall) -> StorageResult<()> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(call);
        match self.fail_at {
            Some((at, Failure::Rejected(status))) if at == index => Err(StorageError::Rejected {
                status,
                message: "Invalid image file".to_string(),
            }),
            Some((at, Failure::Unavailable)) if at == index => {
                Err(StorageError::Unavailable("connection refused".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn result_for(&self, name: &str, destination: &StorageDestination, thumb: bool) -> UploadResult {
        match self.kind {
            BackendKind::Cdn => UploadResult::Cdn(CdnUpload {
                image_url: format!("https://cdn.test/{}/{}", destination.folder, name),
                thumb_url: thumb.then(|| format!("https://cdn.test/h_100,w_100/{}.jpg", name)),
                shop_id: destination.shop_id.clone(),
            }),
            BackendKind::ObjectStore => UploadResult::Signed(SignedUpload::issued(
                format!("https://bucket.test/{}?X-Amz-Signature=fake", name),
                Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
                3600,
            )),
        }
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn store_from_url(
        &self,
        remote_url: &str,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResult> {
        self.record(RecordedCall {
            source: remote_url.to_string(),
            shop_id: destination.shop_id.clone(),
            folder: destination.folder.clone(),
            key_or_public_id: destination.key_or_public_id.clone(),
            disk_path: None,
        })?;
        Ok(self.result_for(&destination.key_or_public_id, destination, false))
    }

    async fn store_from_file(
        &self,
        file: &LocalFile,
        destination: &StorageDestination,
    ) -> StorageResult<UploadResult> {
        let disk_path = match &file.body {
            FileBody::Disk(path) => Some((path.clone(), path.exists())),
            FileBody::Memory(_) => None,
        };
        self.record(RecordedCall {
            source: file.original_name.clone(),
            shop_id: destination.shop_id.clone(),
            folder: destination.folder.clone(),
            key_or_public_id: destination.key_or_public_id.clone(),
            disk_path,
        })?;
        Ok(self.result_for(&file.original_name, destination, true))
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }
}
