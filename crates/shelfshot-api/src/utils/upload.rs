//! Common utilities for file upload handlers
//!
//! Multipart fields are buffered either in memory or in a temporary file under the
//! upload directory. Temporary files are owned by [`ReceivedFiles`] and removed when it
//! is dropped, whatever the outcome of the request.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::Multipart;
use bytes::BytesMut;
use shelfshot_core::{AppError, FileBody, LocalFile};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::error::HttpAppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Where file fields are buffered while the request is handled.
#[derive(Debug, Clone)]
pub enum Buffering {
    Memory,
    Disk { dir: PathBuf },
}

/// Files received in one request, in arrival order.
///
/// Holds the temporary files backing disk-buffered fields; dropping it deletes them.
#[derive(Debug, Default)]
pub struct ReceivedFiles {
    pub files: Vec<LocalFile>,
    temp_paths: Vec<TempPath>,
}

/// Collect every file field named `field` from `multipart`.
///
/// Fields with other names, or without a (non-empty) file name, are skipped. Each file is capped at
/// `max_file_size` bytes while it streams in.
pub async fn collect_files(
    mut multipart: Multipart,
    field: &str,
    buffering: &Buffering,
    max_file_size: usize,
) -> Result<ReceivedFiles, HttpAppError> {
    let mut received = ReceivedFiles::default();

    while let Some(mut part) = multipart.next_field().await? {
        let name = part.name().unwrap_or_default().to_string();
        // Browsers send an empty file input as `filename=""` with no bytes.
        let Some(raw_filename) = part
            .file_name()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
        else {
            tracing::debug!(field = %name, "Skipping multipart field without a file");
            continue;
        };
        if name != field {
            tracing::debug!(field = %name, expected = %field, "Skipping unexpected file field");
            continue;
        }

        let filename = sanitize_filename(&raw_filename)?;
        let mime_type = part
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let (body, size) = match buffering {
            Buffering::Memory => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = part.chunk().await? {
                    validate_file_size(buf.len() + chunk.len(), max_file_size)?;
                    buf.extend_from_slice(&chunk);
                }
                let size = buf.len() as u64;
                (FileBody::Memory(buf.freeze()), size)
            }
            Buffering::Disk { dir } => {
                let (file, temp_path) = tempfile::Builder::new()
                    .prefix(&format!("{}-", unix_millis()))
                    .suffix(&format!("-{}", filename))
                    .tempfile_in(dir)
                    .map_err(AppError::from)?
                    .into_parts();
                let path = temp_path.to_path_buf();
                // Owned from here on so every early return removes the file.
                received.temp_paths.push(temp_path);

                let mut file = tokio::fs::File::from_std(file);
                let mut size = 0usize;
                while let Some(chunk) = part.chunk().await? {
                    size += chunk.len();
                    validate_file_size(size, max_file_size)?;
                    file.write_all(&chunk).await.map_err(AppError::from)?;
                }
                file.flush().await.map_err(AppError::from)?;

                tracing::debug!(path = %path.display(), size_bytes = size, "Buffered upload to disk");
                (FileBody::Disk(path), size as u64)
            }
        };

        received.files.push(LocalFile {
            original_name: filename,
            mime_type,
            size_bytes: size,
            body,
        });
    }

    Ok(received)
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    if filename.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let filename_only = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() || sanitized.len() < 3 {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}
