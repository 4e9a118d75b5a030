//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors from the
//! storage and processing crates convert into `HttpAppError` here so every failure
//! renders with the same status mapping, body shape and log level.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediagate_core::{AppError, ErrorMetadata, LogLevel};
use mediagate_processing::{IngestError, ValidationError};
use mediagate_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::utils::spool::SpoolError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(app_error: &AppError, include_details: bool) -> Self {
        Self {
            error: app_error.client_message(),
            details: include_details.then(|| app_error.detailed_message()),
            error_type: include_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from mediagate-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let include_details = !is_production_env() && !app_error.is_sensitive();
        let body = Json(ErrorResponse::from_app_error(app_error, include_details));

        (status, body).into_response()
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        let app = match err {
            ValidationError::TooLarge { .. } => AppError::PayloadTooLarge(message),
            ValidationError::UnsupportedType { .. } => AppError::UnsupportedMediaType(message),
            ValidationError::SignatureMismatch { .. } => AppError::SignatureMismatch(message),
            ValidationError::EmptyFile | ValidationError::LengthMismatch { .. } => {
                AppError::InvalidInput(message)
            }
        };
        HttpAppError(app)
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::AlreadyExists(key) => {
                AppError::Conflict(format!("Object already exists: {}", key))
            }
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::NotFound(msg)
            | StorageError::UploadFailed(msg)
            | StorageError::DownloadFailed(msg)
            | StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<IngestError> for HttpAppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(e) => e.into(),
            IngestError::Conflict(key) => HttpAppError(AppError::Conflict(format!(
                "Object already exists: {}",
                key
            ))),
            IngestError::InvalidPath(msg) => HttpAppError(AppError::InvalidInput(msg)),
            IngestError::Storage(e) => e.into(),
            IngestError::PayloadRead(e) => {
                HttpAppError(AppError::Internal(format!("Failed to read upload: {}", e)))
            }
        }
    }
}

impl From<SpoolError> for HttpAppError {
    fn from(err: SpoolError) -> Self {
        let app = match err {
            SpoolError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            SpoolError::Io(e) => AppError::Internal(format!("Failed to buffer upload: {}", e)),
        };
        HttpAppError(app)
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        let message = format!("Failed to read multipart body: {}", err.body_text());
        let app = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(message)
        } else {
            AppError::BadRequest(message)
        };
        HttpAppError(app)
    }
}

/// Non-multipart bodies get our ErrorResponse format instead of axum's plain text.
impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        HttpAppError(AppError::BadRequest(format!(
            "Expected a multipart/form-data body: {}",
            rejection.body_text()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: HttpAppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_validation_status_mapping() {
        let cases = [
            (
                ValidationError::TooLarge {
                    declared: 10,
                    max: 5,
                },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ValidationError::UnsupportedType {
                    mime_type: "application/x-msdownload".to_string(),
                },
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ValidationError::SignatureMismatch {
                    mime_type: "image/png".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ValidationError::EmptyFile, StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            assert_eq!(status_of(err.into()), expected);
        }
    }

    #[test]
    fn test_ingest_status_mapping() {
        assert_eq!(
            status_of(IngestError::Conflict("media/a.png".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(IngestError::InvalidPath("..".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(IngestError::Storage(StorageError::BackendError("down".to_string())).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_sensitive_errors_hide_details() {
        let app = AppError::Storage("bucket credentials rejected".to_string());
        let body = ErrorResponse::from_app_error(&app, !app.is_sensitive());
        assert!(body.details.is_none());
        assert_eq!(body.code, "STORAGE_ERROR");
        assert!(body.recoverable);
    }
}
