//! Upload pipeline: size → type → signature → commit → thumbnails.
//!
//! Below the large-file threshold the payload is read fully, checked against
//! its declared length and signature, committed from memory and, for raster
//! types, thumbnailed. At or above the threshold only the leading bytes are
//! checked; the payload is then streamed to storage and never decoded.

use bytes::Bytes;
use mediagate_core::{PipelineConfig, PipelineResult, StoredObject};
use mediagate_storage::{PayloadReader, Storage, StorageError};
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use super::commit::StorageCommitter;
use super::derivatives::DerivativeGenerator;
use super::stream::ExactLengthReader;
use super::types::{PayloadSource, UploadRequest};
use crate::image::{ImageCodec, ImageRsCodec};
use crate::validator::{
    is_raster, normalize_mime, SignatureValidator, SizeGate, TypeAllowlist, ValidationError,
};

/// Terminal failures of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Object already exists: {0}")]
    Conflict(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage failure: {0}")]
    Storage(#[source] StorageError),

    #[error("Failed to read upload payload: {0}")]
    PayloadRead(#[source] std::io::Error),
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AlreadyExists(key) => IngestError::Conflict(key),
            StorageError::InvalidKey(msg) => IngestError::InvalidPath(msg),
            other => IngestError::Storage(other),
        }
    }
}

impl IngestError {
    /// Stable machine-readable failure reason.
    pub fn reason(&self) -> &'static str {
        match self {
            IngestError::Validation(e) => e.reason(),
            IngestError::Conflict(_) => "conflict",
            IngestError::InvalidPath(_) => "invalid_path",
            IngestError::Storage(_) => "storage_error",
            IngestError::PayloadRead(_) => "payload_read",
        }
    }
}

/// Validates, commits and thumbnails uploads.
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct UploadPipeline<C: ImageCodec = ImageRsCodec> {
    config: PipelineConfig,
    allowlist: TypeAllowlist,
    signatures: SignatureValidator,
    committer: StorageCommitter,
    derivatives: DerivativeGenerator<C>,
}

impl UploadPipeline<ImageRsCodec> {
    pub fn new(storage: Arc<dyn Storage>, config: PipelineConfig) -> Self {
        Self::with_codec(storage, config, ImageRsCodec)
    }
}

impl<C: ImageCodec> UploadPipeline<C> {
    pub fn with_codec(storage: Arc<dyn Storage>, mut config: PipelineConfig, codec: C) -> Self {
        let signatures = SignatureValidator::default();
        let min_prefix = signatures.min_prefix_len();
        if config.signature_prefix_bytes < min_prefix {
            tracing::warn!(
                configured = config.signature_prefix_bytes,
                raised_to = min_prefix,
                "Signature prefix shorter than the longest signature, raising it"
            );
            config.signature_prefix_bytes = min_prefix;
        }

        let committer = StorageCommitter::new(storage);
        let derivatives = DerivativeGenerator::new(
            codec,
            committer.clone(),
            config.derivative_specs.clone(),
            config.derivative_concurrency,
            config.derivative_timeout,
        );

        Self {
            config,
            allowlist: TypeAllowlist,
            signatures,
            committer,
            derivatives,
        }
    }

    /// Run the pipeline for one request.
    #[tracing::instrument(
        skip(self, request),
        fields(
            bucket = %request.bucket,
            path = %request.path,
            mime_type = %request.mime_type,
            declared_length = request.declared_length,
        )
    )]
    pub async fn run(&self, request: UploadRequest) -> Result<PipelineResult, IngestError> {
        let start = std::time::Instant::now();
        let UploadRequest {
            file_name,
            mime_type,
            declared_length,
            source,
            bucket,
            path,
            max_size_mb,
        } = request;

        let mime_type = normalize_mime(&mime_type);
        self.validate_declared(&mime_type, declared_length, max_size_mb)
            .inspect_err(|e| {
                tracing::debug!(reason = e.reason(), error = %e, "Upload rejected");
            })?;

        let large = declared_length >= self.config.large_file_threshold_bytes;
        let (stored, thumbnails) = if large {
            let stored = self
                .ingest_streaming(&bucket, &path, &mime_type, declared_length, source)
                .await?;
            (stored, Vec::new())
        } else {
            let data = Self::read_exact(source, declared_length)
                .await
                .inspect_err(|e| tracing::debug!(error = %e, "Upload rejected"))?;
            self.check_signature(&mime_type, &data)?;

            let stored = self
                .committer
                .commit_bytes(&bucket, &path, &mime_type, data.clone())
                .await?;

            let thumbnails = if is_raster(&mime_type) {
                self.derivatives.generate(&bucket, &path, data).await
            } else {
                Vec::new()
            };
            (stored, thumbnails)
        };

        tracing::info!(
            bucket = %stored.bucket,
            path = %stored.path,
            size_bytes = stored.size_bytes,
            thumbnails = thumbnails.len(),
            large_file = large,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload stored"
        );

        Ok(PipelineResult::stored(file_name, stored, thumbnails))
    }

    /// Checks that need no payload bytes, in gate order.
    pub fn validate_declared(
        &self,
        mime_type: &str,
        declared_length: u64,
        max_size_mb: u64,
    ) -> Result<(), ValidationError> {
        SizeGate::from_mb(max_size_mb).check(declared_length)?;
        self.allowlist.check(mime_type)
    }

    fn check_signature(&self, mime_type: &str, prefix: &[u8]) -> Result<(), ValidationError> {
        self.signatures.check(mime_type, prefix).inspect_err(|e| {
            tracing::debug!(reason = e.reason(), mime_type = %mime_type, "Upload rejected");
        })
    }

    /// Read the whole payload, reading at most one byte past the declared length.
    async fn read_exact(source: PayloadSource, declared_length: u64) -> Result<Bytes, IngestError> {
        let data = match source {
            PayloadSource::Buffered(bytes) => bytes,
            PayloadSource::Stream(reader) => {
                let mut buffer = Vec::with_capacity(declared_length as usize);
                reader
                    .take(declared_length.saturating_add(1))
                    .read_to_end(&mut buffer)
                    .await
                    .map_err(IngestError::PayloadRead)?;
                Bytes::from(buffer)
            }
        };

        let actual = data.len() as u64;
        if actual != declared_length {
            return Err(ValidationError::LengthMismatch {
                declared: declared_length,
                actual,
            }
            .into());
        }
        Ok(data)
    }

    async fn ingest_streaming(
        &self,
        bucket: &str,
        path: &str,
        mime_type: &str,
        declared_length: u64,
        source: PayloadSource,
    ) -> Result<StoredObject, IngestError> {
        let mut reader = match source {
            PayloadSource::Buffered(bytes) => {
                let data = Self::read_exact(PayloadSource::Buffered(bytes), declared_length).await?;
                self.check_signature(mime_type, &data)?;
                return Ok(self
                    .committer
                    .commit_bytes(bucket, path, mime_type, data)
                    .await?);
            }
            PayloadSource::Stream(reader) => reader,
        };

        let prefix_len = self.config.signature_prefix_bytes as u64;
        let mut prefix = Vec::with_capacity(self.config.signature_prefix_bytes);
        (&mut reader)
            .take(prefix_len)
            .read_to_end(&mut prefix)
            .await
            .map_err(IngestError::PayloadRead)?;

        self.check_signature(mime_type, &prefix)?;

        let rejoined: PayloadReader = Box::pin(ExactLengthReader::new(
            Cursor::new(prefix).chain(reader),
            declared_length,
        ));

        Ok(self
            .committer
            .commit_stream(bucket, path, mime_type, declared_length, rejoined)
            .await?)
    }
}
