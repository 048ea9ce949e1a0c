//! Shared key generation for storage backends.
//!
//! The CDN addresses objects by a readable public id derived from the original file
//! name; the object store uses an opaque random key so reused file names never collide.

use crate::traits::{StorageError, StorageResult};

/// Random object key: 32 lowercase hex chars (128 bits of OS randomness).
pub fn generate_object_key() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Public id for a file name: directory components and extension dropped, characters
/// outside `[A-Za-z0-9_-]` replaced by `_`.
///
/// `shoe.png` becomes `shoe`; `../x/red shoe.v2.png` becomes `red_shoe_v2`.
pub fn public_id_from_filename(filename: &str) -> StorageResult<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };

    let public_id: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if public_id.trim_matches('_').is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "cannot derive a public id from file name '{}'",
            filename
        )));
    }

    Ok(public_id)
}

/// Reject keys that could escape their folder.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "key '{}' must be relative and must not contain '..'",
            key
        )));
    }
    Ok(())
}
