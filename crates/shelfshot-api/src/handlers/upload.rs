//! Product image upload handlers
//!
//! Each route fixes the backend and the payload shape; the coordinator does the rest.
//! Handlers only extract, buffer and wrap the outcome in the success envelope.

use std::sync::Arc;

use axum::extract::{
    multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State,
};
use serde::Deserialize;
use shelfshot_core::constants::{MULTI_FILE_FIELD, SINGLE_FILE_FIELD};
use shelfshot_core::{AppError, BackendKind};
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError};
use crate::response::SuccessResponse;
use crate::services::upload::{UploadOutcome, UploadRequest};
use crate::state::AppState;
use crate::utils::upload::{collect_files, Buffering};
use crate::validation::validate_shop_id;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Remote image to store (http/https). Only read by `POST /upload/product`.
    pub url: Option<String>,
    /// Tenant folder; defaults to the configured shop id
    pub shop_id: Option<String>,
}

fn resolve_shop_id(state: &AppState, query: &UploadQuery) -> Result<String, AppError> {
    let shop_id = query
        .shop_id
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.upload().default_shop_id.clone());
    validate_shop_id(&shop_id)?;
    Ok(shop_id)
}

fn query_or_reject(query: Result<Query<UploadQuery>, QueryRejection>) -> Result<UploadQuery, AppError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| AppError::InvalidInput(format!("Invalid query string: {}", e.body_text())))
}

fn multipart_or_reject(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Multipart, AppError> {
    multipart.map_err(|e| {
        AppError::MissingPayload(format!("Expected a multipart/form-data body: {}", e.body_text()))
    })
}

/// Store a remote image on the CDN
///
/// Without `url`, the configured demo image is stored under its fixed public id.
#[utoipa::path(
    post,
    path = "/upload/product",
    tag = "upload",
    params(UploadQuery),
    responses(
        (status = 200, description = "Image stored on the CDN", body = SuccessResponse<UploadOutcome>),
        (status = 400, description = "Invalid url or shop_id", body = ErrorResponse),
        (status = 502, description = "CDN unreachable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "upload_from_url"))]
pub async fn upload_from_url(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UploadQuery>, QueryRejection>,
) -> Result<SuccessResponse<UploadOutcome>, HttpAppError> {
    let query = query_or_reject(query)?;
    let shop_id = resolve_shop_id(&state, &query)?;
    let upload = state.upload();

    // A caller-supplied URL gets its public id from the URL basename.
    let (url, public_id) = match query.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => (url, ""),
        None => (
            upload.demo_image_url.as_str(),
            upload.demo_image_public_id.as_str(),
        ),
    };

    let outcome = state
        .coordinator
        .handle(
            BackendKind::Cdn,
            &shop_id,
            UploadRequest::FromUrl { url, public_id },
        )
        .await?;

    Ok(SuccessResponse::uploaded(outcome))
}

/// Upload one image to the CDN and derive its thumbnail
///
/// The file is buffered to a temporary file that is removed once the request ends.
#[utoipa::path(
    post,
    path = "/upload/product/thumb",
    tag = "upload",
    params(UploadQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `file`: exactly one image"),
    responses(
        (status = 200, description = "Image stored with a 100x100 thumbnail", body = SuccessResponse<UploadOutcome>),
        (status = 400, description = "Missing or extra file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "CDN unreachable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, multipart), fields(operation = "upload_thumb"))]
pub async fn upload_thumb(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<SuccessResponse<UploadOutcome>, HttpAppError> {
    let query = query_or_reject(query)?;
    let shop_id = resolve_shop_id(&state, &query)?;
    let multipart = multipart_or_reject(multipart)?;

    // Temp files live as long as `received`, i.e. until this handler returns.
    let received = collect_files(
        multipart,
        SINGLE_FILE_FIELD,
        &state.disk_buffering(),
        state.upload().max_file_size_bytes,
    )
    .await?;

    let outcome = state
        .coordinator
        .handle(
            BackendKind::Cdn,
            &shop_id,
            UploadRequest::SingleFile {
                field: SINGLE_FILE_FIELD,
                files: &received.files,
            },
        )
        .await?;

    Ok(SuccessResponse::uploaded(outcome))
}

/// Upload several images to the CDN
///
/// Results are returned in the order the files were sent. The first failing file fails
/// the whole request and later files are not uploaded.
#[utoipa::path(
    post,
    path = "/upload/product/multiple",
    tag = "upload",
    params(UploadQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `files`: one or more images"),
    responses(
        (status = 200, description = "One result per file, in input order", body = SuccessResponse<UploadOutcome>),
        (status = 400, description = "No files or too many files", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "CDN unreachable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, multipart), fields(operation = "upload_multiple"))]
pub async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<SuccessResponse<UploadOutcome>, HttpAppError> {
    let query = query_or_reject(query)?;
    let shop_id = resolve_shop_id(&state, &query)?;
    let multipart = multipart_or_reject(multipart)?;
    let upload = state.upload();

    let received = collect_files(
        multipart,
        MULTI_FILE_FIELD,
        &Buffering::Memory,
        upload.max_file_size_bytes,
    )
    .await?;

    let outcome = state
        .coordinator
        .handle(
            BackendKind::Cdn,
            &shop_id,
            UploadRequest::MultipleFiles {
                field: MULTI_FILE_FIELD,
                files: &received.files,
                max: upload.max_files_per_request,
            },
        )
        .await?;

    Ok(SuccessResponse::uploaded(outcome))
}

/// Upload one file to the private bucket and return a signed URL
#[utoipa::path(
    post,
    path = "/upload/product/bucket",
    tag = "upload",
    params(UploadQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `file`: exactly one file"),
    responses(
        (status = 200, description = "Object stored; time-limited URL returned", body = SuccessResponse<UploadOutcome>),
        (status = 400, description = "Missing or extra file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Object store unreachable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, multipart), fields(operation = "upload_bucket"))]
pub async fn upload_bucket(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<SuccessResponse<UploadOutcome>, HttpAppError> {
    let query = query_or_reject(query)?;
    let shop_id = resolve_shop_id(&state, &query)?;
    let multipart = multipart_or_reject(multipart)?;

    let received = collect_files(
        multipart,
        SINGLE_FILE_FIELD,
        &Buffering::Memory,
        state.upload().max_file_size_bytes,
    )
    .await?;

    let outcome = state
        .coordinator
        .handle(
            BackendKind::ObjectStore,
            &shop_id,
            UploadRequest::SingleFile {
                field: SINGLE_FILE_FIELD,
                files: &received.files,
            },
        )
        .await?;

    Ok(SuccessResponse::uploaded(outcome))
}
