//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mediagate API",
        version = "0.1.0",
        description = "Validated file ingest with no-clobber storage and JPEG thumbnails"
    ),
    paths(
        handlers::upload::upload_file,
        handlers::health::health_check,
    ),
    components(schemas(
        handlers::upload::UploadResponse,
        handlers::upload::ThumbnailResponse,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "uploads", description = "File upload and thumbnail generation"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
