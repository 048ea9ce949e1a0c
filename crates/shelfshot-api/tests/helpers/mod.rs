//! Test application over the real router with recording fake backends.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use axum_test::TestServer;
use shelfshot_api::setup::routes;
use shelfshot_api::AppState;
use shelfshot_core::Config;
use shelfshot_storage::Backends;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use storage::RecordingBackend;

/// Test application state
pub struct TestApp {
    pub server: TestServer,
    pub cdn: Arc<RecordingBackend>,
    pub bucket: Arc<RecordingBackend>,
    pub upload_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Entries left in the disk buffer directory
    pub fn buffered_files(&self) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(self.upload_dir.path())
            .expect("read upload dir")
            .map(|entry| entry.expect("dir entry").path())
            .collect()
    }
}

/// Variables every test config needs; provider credentials are never used by fakes.
fn base_vars(upload_dir: &TempDir) -> HashMap<String, String> {
    [
        ("CDN_CLOUD_NAME", "shelfshot-test"),
        ("CDN_API_KEY", "key"),
        ("CDN_API_SECRET", "secret"),
        ("AWS_BUCKET_NAME", "products-private"),
        ("AWS_BUCKET_REGION", "eu-west-1"),
        ("AWS_BUCKET_ACCESS_KEY", "access"),
        ("AWS_BUCKET_SECRET_KEY", "secret"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .chain(std::iter::once((
        "UPLOAD_DIR".to_string(),
        upload_dir.path().to_string_lossy().to_string(),
    )))
    .collect()
}

/// Setup a test application with default settings and healthy backends
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(RecordingBackend::cdn(), RecordingBackend::bucket(), &[]).await
}

/// Setup a test application with the given backends and extra environment variables
pub async fn setup_test_app_with(
    cdn: RecordingBackend,
    bucket: RecordingBackend,
    vars: &[(&str, &str)],
) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload directory");

    let mut env = base_vars(&upload_dir);
    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }
    let config = Config::from_lookup(|key| env.get(key).cloned()).expect("Failed to build config");

    let cdn = Arc::new(cdn);
    let bucket = Arc::new(bucket);
    let backends = Backends {
        cdn: cdn.clone(),
        object_store: bucket.clone(),
    };

    let state = Arc::new(AppState::new(config.clone(), backends));
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        cdn,
        bucket,
        upload_dir,
    }
}
