//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use shelfshot_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfshot API",
        version = "0.1.0",
        description = "Product image uploads for shop catalogues. Images go either to a media CDN (public URL plus derived thumbnail) or to a private S3 bucket (time-limited signed URL)."
    ),
    paths(
        handlers::upload::upload_from_url,
        handlers::upload::upload_thumb,
        handlers::upload::upload_multiple,
        handlers::upload::upload_bucket,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::CdnUpload,
            models::SignedUpload,
            models::UploadResult,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "upload", description = "Product image uploads to the CDN or the private bucket"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
