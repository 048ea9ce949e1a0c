use crate::{CdnStorage, S3Storage, StorageBackend, StorageError, StorageResult};
use shelfshot_core::Config;
use std::sync::Arc;
use std::time::Duration;

/// Both provider clients, constructed once per process and shared by every request.
#[derive(Clone)]
pub struct Backends {
    pub cdn: Arc<dyn StorageBackend>,
    pub object_store: Arc<dyn StorageBackend>,
}

/// Create the storage backends from configuration
///
/// Provider calls share one HTTP client; its timeout is the only time limit applied to
/// a provider call.
pub fn create_backends(config: &Config) -> StorageResult<Backends> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.provider_timeout_secs))
        .build()
        .map_err(|e| StorageError::Config(format!("Failed to build HTTP client: {}", e)))?;

    let cdn = CdnStorage::new(config.cdn.clone(), http.clone());
    let object_store = S3Storage::from_config(&config.object_store, http)?;

    tracing::info!(
        cloud_name = %config.cdn.cloud_name,
        bucket = %config.object_store.bucket,
        region = %config.object_store.region,
        "Storage backends initialized"
    );

    Ok(Backends {
        cdn: Arc::new(cdn),
        object_store: Arc::new(object_store),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfshot_core::BackendKind;

    #[test]
    fn builds_both_backends_without_network() {
        let vars = [
            ("CDN_CLOUD_NAME", "shop-cloud"),
            ("CDN_API_KEY", "key"),
            ("CDN_API_SECRET", "secret"),
            ("AWS_BUCKET_NAME", "product-images"),
            ("AWS_BUCKET_REGION", "eu-west-1"),
            ("AWS_BUCKET_ACCESS_KEY", "AKIA"),
            ("AWS_BUCKET_SECRET_KEY", "shh"),
            ("AWS_BUCKET_ENDPOINT", "http://localhost:9000"),
        ];
        let config = Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap();

        let backends = create_backends(&config).unwrap();
        assert_eq!(backends.cdn.kind(), BackendKind::Cdn);
        assert_eq!(backends.object_store.kind(), BackendKind::ObjectStore);
    }
}
