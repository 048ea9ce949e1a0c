//! Application state.
//!
//! Built once at startup and shared by every handler behind an `Arc`.

use shelfshot_core::{Config, UploadConfig};
use shelfshot_storage::Backends;

use crate::services::upload::UploadCoordinator;
use crate::utils::upload::Buffering;

pub struct AppState {
    pub config: Config,
    pub coordinator: UploadCoordinator,
    /// Error bodies carry `details` and `error_type` outside production.
    pub expose_error_details: bool,
}

impl AppState {
    /// Wire the coordinator over `backends` using the upload policy from `config`.
    pub fn new(config: Config, backends: Backends) -> Self {
        let coordinator = UploadCoordinator::new(
            backends,
            config.upload.policy,
            config.upload.folder_prefix.clone(),
        );
        Self {
            expose_error_details: !config.is_production(),
            config,
            coordinator,
        }
    }

    pub fn upload(&self) -> &UploadConfig {
        &self.config.upload
    }

    pub(crate) fn disk_buffering(&self) -> Buffering {
        Buffering::Disk {
            dir: self.config.upload.upload_dir.clone(),
        }
    }
}
