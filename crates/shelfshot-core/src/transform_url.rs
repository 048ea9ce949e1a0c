//! CDN transformation URL builder
//!
//! Derived renditions are never uploaded: the CDN renders them on the fly from a
//! delivery URL that encodes the transformation next to the stored public id, e.g.
//! `https://res.cloudinary.com/{cloud}/image/upload/h_100,w_100/products/0000/shoe.jpg`.

use crate::constants::{THUMB_FORMAT, THUMB_HEIGHT, THUMB_WIDTH};

/// Builder for CDN delivery URLs with on-the-fly transformations
///
/// # Example
///
/// ```rust
/// use shelfshot_core::transform_url::ImageTransformUrlBuilder;
///
/// let url = ImageTransformUrlBuilder::new()
///     .dimensions(100, 100)
///     .format("jpg")
///     .build("https://res.cloudinary.com", "demo", "products/0000/shoe");
/// assert_eq!(
///     url,
///     "https://res.cloudinary.com/demo/image/upload/h_100,w_100/products/0000/shoe.jpg"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTransformUrlBuilder {
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
}

impl ImageTransformUrlBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed thumbnail rendition: 100x100, jpg.
    pub fn thumbnail() -> Self {
        Self::new()
            .dimensions(THUMB_WIDTH, THUMB_HEIGHT)
            .format(THUMB_FORMAT)
    }

    /// Set both width and height
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set output format; becomes the extension of the delivered file
    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.trim_start_matches('.').to_string());
        self
    }

    /// Transformation component, parameters in alphabetical order (`h_`, `w_`).
    ///
    /// Empty when no transformation is set.
    pub fn transformation(&self) -> String {
        let mut params = Vec::with_capacity(2);
        if let Some(height) = self.height {
            params.push(format!("h_{}", height));
        }
        if let Some(width) = self.width {
            params.push(format!("w_{}", width));
        }
        params.join(",")
    }

    /// Build the delivery URL for `public_id` in `cloud_name`.
    pub fn build(&self, delivery_base: &str, cloud_name: &str, public_id: &str) -> String {
        let mut url = format!(
            "{}/{}/image/upload/",
            delivery_base.trim_end_matches('/'),
            cloud_name
        );

        let transformation = self.transformation();
        if !transformation.is_empty() {
            url.push_str(&transformation);
            url.push('/');
        }

        url.push_str(public_id.trim_start_matches('/'));
        if let Some(ref format) = self.format {
            url.push('.');
            url.push_str(format);
        }
        url
    }
}
