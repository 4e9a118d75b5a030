use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use mediagate_core::{DerivativeArtifact, PipelineResult};
use mediagate_processing::{PayloadSource, UploadRequest};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{display_file_name, extract_upload_form, SpoolLimits};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResponse {
    pub variant: String,
    pub path: String,
    pub public_url: String,
    pub size: u64,
}

impl From<DerivativeArtifact> for ThumbnailResponse {
    fn from(artifact: DerivativeArtifact) -> Self {
        Self {
            variant: artifact.variant,
            path: artifact.path,
            public_url: artifact.public_url,
            size: artifact.size_bytes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub path: String,
    pub public_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub thumbnails: Vec<ThumbnailResponse>,
}

impl From<PipelineResult> for UploadResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            success: result.success,
            path: result.stored.path,
            public_url: result.stored.public_url,
            file_name: result.file_name,
            file_size: result.stored.size_bytes,
            mime_type: result.stored.content_type,
            thumbnails: result.thumbnails.into_iter().map(Into::into).collect(),
        }
    }
}

/// Upload a file
///
/// Validates the file (size, allowlisted type, magic bytes), stores it at
/// `bucket/filePath` without overwriting, and for JPEG, PNG and WebP images
/// below the large-file threshold also stores JPEG thumbnails next to it.
///
/// Form fields: `file` (required), `bucket` (required), `filePath` (required),
/// `maxSizeMB` (optional, binary megabytes).
///
/// # Errors
/// - 400: malformed form, missing fields or an invalid path
/// - 409: an object already exists at the path
/// - 413: file exceeds `maxSizeMB` or the server ceiling
/// - 415: content type not allowlisted
/// - 422: file bytes do not match the declared type
/// - 502: storage backend failure
#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Path already taken", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Unsupported media type", body = ErrorResponse),
        (status = 422, description = "Signature mismatch", body = ErrorResponse),
        (status = 502, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let limits = SpoolLimits {
        memory_limit: state.config.pipeline().large_file_threshold_bytes,
        max_upload_bytes: state.config.max_upload_bytes(),
    };
    let form = extract_upload_form(multipart?, limits).await?;

    let file_name = display_file_name(form.file_name.as_deref(), &form.file_path);
    let declared_length = form.spool.len();
    let max_size_mb = form
        .max_size_mb
        .unwrap_or_else(|| state.config.default_max_size_mb());

    tracing::debug!(
        bucket = %form.bucket,
        path = %form.file_path,
        content_type = %form.content_type,
        declared_length = declared_length,
        spooled_to_disk = form.spool.is_on_disk(),
        "Upload received"
    );

    let request = match form.spool.into_source().await? {
        PayloadSource::Buffered(data) => UploadRequest::from_bytes(
            file_name,
            form.content_type,
            form.bucket,
            form.file_path,
            max_size_mb,
            data,
        ),
        PayloadSource::Stream(reader) => UploadRequest::from_reader(
            file_name,
            form.content_type,
            form.bucket,
            form.file_path,
            max_size_mb,
            declared_length,
            reader,
        ),
    };

    let result = state.pipeline.run(request).await?;

    Ok(Json(result.into()))
}
