//! Multipart form extraction for the upload endpoint

use axum::extract::Multipart;
use mediagate_core::constants::BYTES_PER_MB;
use mediagate_core::AppError;

use super::spool::UploadSpool;
use crate::error::HttpAppError;

const FILE_FIELD: &str = "file";
const BUCKET_FIELD: &str = "bucket";
const PATH_FIELD: &str = "filePath";
const MAX_SIZE_FIELD: &str = "maxSizeMB";

/// Limits applied while the body is read.
#[derive(Debug, Clone, Copy)]
pub struct SpoolLimits {
    /// File parts at or above this size are spooled to disk.
    pub memory_limit: u64,
    /// Transport ceiling in bytes.
    pub max_upload_bytes: u64,
}

/// The file part plus the text fields that describe where it goes.
pub struct UploadForm {
    pub file_name: Option<String>,
    pub content_type: String,
    pub spool: UploadSpool,
    pub bucket: String,
    pub file_path: String,
    pub max_size_mb: Option<u64>,
}

/// Read the upload form. Exactly one `file` field is accepted.
///
/// When `maxSizeMB` arrives before the file, the file is cut off as soon as it
/// passes that limit instead of the transport ceiling.
pub async fn extract_upload_form(
    mut multipart: Multipart,
    limits: SpoolLimits,
) -> Result<UploadForm, HttpAppError> {
    let mut file: Option<(Option<String>, String, UploadSpool)> = None;
    let mut bucket: Option<String> = None;
    let mut file_path: Option<String> = None;
    let mut max_size_mb: Option<u64> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FILE_FIELD => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    )
                    .into());
                }
                let file_name = field.file_name().map(|s: &str| s.to_string());
                let content_type = field
                    .content_type()
                    .map(|s: &str| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let ceiling = max_size_mb
                    .map(|mb| mb.saturating_mul(BYTES_PER_MB))
                    .unwrap_or(limits.max_upload_bytes)
                    .min(limits.max_upload_bytes);
                let mut spool = UploadSpool::new(limits.memory_limit, ceiling);
                while let Some(chunk) = field.chunk().await? {
                    spool.push(&chunk).await?;
                }

                file = Some((file_name, content_type, spool));
            }
            BUCKET_FIELD => bucket = Some(field.text().await?.trim().to_string()),
            PATH_FIELD => file_path = Some(field.text().await?.trim().to_string()),
            MAX_SIZE_FIELD => {
                let raw = field.text().await?;
                max_size_mb = Some(parse_max_size_mb(&raw)?);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let (file_name, content_type, spool) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    let bucket = bucket
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing 'bucket' field".to_string()))?;
    let file_path = file_path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing 'filePath' field".to_string()))?;

    Ok(UploadForm {
        file_name,
        content_type,
        spool,
        bucket,
        file_path,
        max_size_mb,
    })
}

pub fn parse_max_size_mb(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(mb) if mb > 0 => Ok(mb),
        _ => Err(AppError::InvalidInput(format!(
            "maxSizeMB must be a positive integer, got '{}'",
            raw.trim()
        ))),
    }
}

/// File name reported back to the caller: the part's own name, else the last path segment.
pub fn display_file_name(file_name: Option<&str>, file_path: &str) -> String {
    file_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            file_path
                .rsplit('/')
                .next()
                .unwrap_or(file_path)
                .to_string()
        })
}
