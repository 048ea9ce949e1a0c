//! Fixed values shared across crates.

/// Shop id used when the request does not name one.
pub const DEFAULT_SHOP_ID: &str = "0000";

/// Folder prefix under which product images are grouped: `{prefix}/{shop_id}`.
pub const DEFAULT_FOLDER_PREFIX: &str = "products";

/// Thumbnail edge length in pixels.
pub const THUMB_WIDTH: u32 = 100;
pub const THUMB_HEIGHT: u32 = 100;

/// Output format of derived thumbnails.
pub const THUMB_FORMAT: &str = "jpg";

/// Lifetime of object-store signed URLs.
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 3600;

/// Source image for the URL upload route when the caller supplies none.
pub const DEMO_IMAGE_URL: &str =
    "https://res.cloudinary.com/demo/image/upload/getting-started/shoes.jpg";
pub const DEMO_IMAGE_PUBLIC_ID: &str = "shoes";

/// Multipart field names.
pub const SINGLE_FILE_FIELD: &str = "file";
pub const MULTI_FILE_FIELD: &str = "files";

/// Longest accepted shop id; shop ids become folder names.
pub const MAX_SHOP_ID_LENGTH: usize = 64;
