use std::fmt::{Display, Formatter, Result as FmtResult};

/// Storage backend variants.
///
/// The variant for a request is chosen by the route, never by inspecting content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Media transformation CDN: public ids, derived thumbnails
    Cdn,
    /// Private bucket: random keys, signed URLs
    ObjectStore,
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BackendKind::Cdn => write!(f, "cdn"),
            BackendKind::ObjectStore => write!(f, "object_store"),
        }
    }
}
