//! Configuration module
//!
//! All settings are read once at startup from the process environment (after loading
//! `.env` when present). Missing provider credentials are a startup error, never a
//! per-request one.

use std::env;
use std::path::PathBuf;

use std::str::FromStr;

use crate::constants::{
    DEFAULT_FOLDER_PREFIX, DEFAULT_SHOP_ID, DEFAULT_SIGNED_URL_EXPIRY_SECS, DEMO_IMAGE_PUBLIC_ID,
    DEMO_IMAGE_URL, MAX_SHOP_ID_LENGTH,
};
use crate::models::is_valid_shop_id;

const DEFAULT_PORT: u16 = 3055;
const MAX_FILE_SIZE_MB: usize = 10;
const MAX_FILES_PER_REQUEST: usize = 10;
const UPLOAD_CONCURRENCY: usize = 1;
const PROVIDER_TIMEOUT_SECS: u64 = 30;

/// CDN account settings
#[derive(Clone, Debug)]
pub struct CdnConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Management API base, e.g. `https://api.cloudinary.com`
    pub api_base_url: String,
    /// Delivery base used for canonical and derived URLs
    pub delivery_base_url: String,
}

/// S3 bucket settings
#[derive(Clone, Debug)]
pub struct ObjectStoreConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub endpoint: Option<String>,
    pub signed_url_expiry_secs: u64,
}

/// How a batch of files is dispatched to a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadPolicy {
    /// One file at a time, in input order; stop at the first failure.
    Sequential,
    /// Up to `limit` uploads in flight; results keep input order, first error wins.
    Concurrent { limit: usize },
}

impl UploadPolicy {
    /// `1` (or `0`) means sequential.
    pub fn from_concurrency(limit: usize) -> Self {
        if limit <= 1 {
            UploadPolicy::Sequential
        } else {
            UploadPolicy::Concurrent { limit }
        }
    }
}

/// Inbound upload handling settings
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub max_files_per_request: usize,
    pub policy: UploadPolicy,
    pub default_shop_id: String,
    pub folder_prefix: String,
    pub demo_image_url: String,
    pub demo_image_public_id: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub provider_timeout_secs: u64,
    pub cdn: CdnConfig,
    pub object_store: ObjectStoreConfig,
    pub upload: UploadConfig,
}

/// `default` when unset; an error naming `key` when set but unparseable.
fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, anyhow::Error> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow::anyhow!("{} must be set", key))
        };

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;

        let cdn = CdnConfig {
            cloud_name: required("CDN_CLOUD_NAME")?,
            api_key: required("CDN_API_KEY")?,
            api_secret: required("CDN_API_SECRET")?,
            api_base_url: var("CDN_API_BASE_URL")
                .unwrap_or_else(|| "https://api.cloudinary.com".to_string()),
            delivery_base_url: var("CDN_DELIVERY_BASE_URL")
                .unwrap_or_else(|| "https://res.cloudinary.com".to_string()),
        };

        let object_store = ObjectStoreConfig {
            bucket: required("AWS_BUCKET_NAME")?,
            region: required("AWS_BUCKET_REGION")?,
            access_key_id: required("AWS_BUCKET_ACCESS_KEY")?,
            secret_access_key: required("AWS_BUCKET_SECRET_KEY")?,
            endpoint: var("AWS_BUCKET_ENDPOINT"),
            signed_url_expiry_secs: parse_or(
                var("SIGNED_URL_EXPIRY_SECS"),
                "SIGNED_URL_EXPIRY_SECS",
                DEFAULT_SIGNED_URL_EXPIRY_SECS,
            )?,
        };

        let upload = UploadConfig {
            upload_dir: PathBuf::from(var("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string())),
            max_file_size_bytes: parse_or(var("MAX_FILE_SIZE_MB"), "MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB)?
                .checked_mul(1024 * 1024)
                .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large"))?,
            max_files_per_request: parse_or(
                var("MAX_FILES_PER_REQUEST"),
                "MAX_FILES_PER_REQUEST",
                MAX_FILES_PER_REQUEST,
            )?,
            policy: UploadPolicy::from_concurrency(parse_or(
                var("UPLOAD_CONCURRENCY"),
                "UPLOAD_CONCURRENCY",
                UPLOAD_CONCURRENCY,
            )?),
            default_shop_id: var("DEFAULT_SHOP_ID").unwrap_or_else(|| DEFAULT_SHOP_ID.to_string()),
            folder_prefix: var("PRODUCT_FOLDER_PREFIX")
                .unwrap_or_else(|| DEFAULT_FOLDER_PREFIX.to_string()),
            demo_image_url: var("DEMO_IMAGE_URL").unwrap_or_else(|| DEMO_IMAGE_URL.to_string()),
            demo_image_public_id: var("DEMO_IMAGE_PUBLIC_ID")
                .unwrap_or_else(|| DEMO_IMAGE_PUBLIC_ID.to_string()),
        };

        let config = Config {
            server_port,
            environment,
            cors_origins,
            provider_timeout_secs: parse_or(
                var("PROVIDER_TIMEOUT_SECS"),
                "PROVIDER_TIMEOUT_SECS",
                PROVIDER_TIMEOUT_SECS,
            )?,
            cdn,
            object_store,
            upload,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.upload.max_files_per_request == 0 {
            return Err(anyhow::anyhow!("MAX_FILES_PER_REQUEST must be greater than 0"));
        }

        if self.object_store.signed_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_EXPIRY_SECS must be greater than 0"));
        }

        if self.provider_timeout_secs == 0 {
            return Err(anyhow::anyhow!("PROVIDER_TIMEOUT_SECS must be greater than 0"));
        }

        if !is_valid_shop_id(&self.upload.default_shop_id) {
            return Err(anyhow::anyhow!(
                "DEFAULT_SHOP_ID must be 1-{} characters of letters, digits, '-' or '_'",
                MAX_SHOP_ID_LENGTH
            ));
        }

        let prefix_ok = !self.upload.folder_prefix.is_empty()
            && self
                .upload
                .folder_prefix
                .trim_end_matches('/')
                .split('/')
                .all(is_valid_shop_id);
        if !prefix_ok {
            return Err(anyhow::anyhow!(
                "PRODUCT_FOLDER_PREFIX must be '/'-separated segments of letters, digits, '-' or '_'"
            ));
        }

        for (name, url) in [
            ("CDN_API_BASE_URL", &self.cdn.api_base_url),
            ("CDN_DELIVERY_BASE_URL", &self.cdn.delivery_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
            }
        }

        Ok(())
    }

    /// Upper bound for a whole request body: every file at its cap plus multipart overhead.
    pub fn max_request_body_bytes(&self) -> usize {
        self.upload
            .max_file_size_bytes
            .saturating_mul(self.upload.max_files_per_request)
            .saturating_add(1024 * 1024)
    }
}
