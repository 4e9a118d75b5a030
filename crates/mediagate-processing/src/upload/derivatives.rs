//! Thumbnail generation.
//!
//! The source is decoded once and shared across variants. Variants run with
//! bounded concurrency; each one succeeds or fails on its own and a failure
//! only drops that variant from the result.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use mediagate_core::constants::DERIVATIVE_CONTENT_TYPE;
use mediagate_core::{DerivativeArtifact, DerivativeSpec};
use mediagate_storage::StorageError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::commit::StorageCommitter;
use super::paths::thumbnail_path;
use crate::image::{bounding_box_dimensions, CodecError, ImageCodec};

/// Why a single variant was skipped.
#[derive(Debug, thiserror::Error)]
pub enum DerivativeError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Failed to store derivative: {0}")]
    Commit(#[from] StorageError),

    #[error("Image task failed: {0}")]
    Task(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Abandoned after timeout")]
    Cancelled,
}

pub struct DerivativeGenerator<C: ImageCodec> {
    codec: Arc<C>,
    committer: StorageCommitter,
    specs: Vec<DerivativeSpec>,
    concurrency: usize,
    timeout: Duration,
}

impl<C: ImageCodec> DerivativeGenerator<C> {
    pub fn new(
        codec: C,
        committer: StorageCommitter,
        specs: Vec<DerivativeSpec>,
        concurrency: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            codec: Arc::new(codec),
            committer,
            specs,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Produce one artifact per variant that fully succeeds, in variant order.
    ///
    /// Never fails: a decode failure yields an empty list.
    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn generate(
        &self,
        bucket: &str,
        base_path: &str,
        data: Bytes,
    ) -> Vec<DerivativeArtifact> {
        if self.specs.is_empty() {
            return Vec::new();
        }

        let codec = Arc::clone(&self.codec);
        let decoded = match tokio::task::spawn_blocking(move || codec.decode(&data)).await {
            Ok(Ok(image)) => Arc::new(image),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Source decode failed, skipping all derivatives");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Decode task failed, skipping all derivatives");
                return Vec::new();
            }
        };
        let source_dims = self.codec.dimensions(&decoded);

        // Futures are built up front so the stream holds no borrowing closure
        let renders: Vec<_> = self
            .specs
            .iter()
            .map(|spec| self.render_spec(bucket, base_path, Arc::clone(&decoded), source_dims, spec))
            .collect();

        stream::iter(renders)
            .buffered(self.concurrency)
            .filter_map(|artifact| async move { artifact })
            .collect()
            .await
    }

    async fn render_spec(
        &self,
        bucket: &str,
        base_path: &str,
        decoded: Arc<C::Image>,
        source_dims: (u32, u32),
        spec: &DerivativeSpec,
    ) -> Option<DerivativeArtifact> {
        let start = std::time::Instant::now();
        let cancelled = Arc::new(AtomicBool::new(false));
        let chain = self.build_artifact(
            bucket,
            base_path,
            decoded,
            source_dims,
            spec,
            Arc::clone(&cancelled),
        );

        let result = match tokio::time::timeout(self.timeout, chain).await {
            Ok(result) => result,
            Err(_) => {
                cancelled.store(true, Ordering::SeqCst);
                Err(DerivativeError::Timeout(self.timeout))
            }
        };

        match result {
            Ok(artifact) => {
                tracing::debug!(
                    variant = %spec.variant,
                    path = %artifact.path,
                    size_bytes = artifact.size_bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Derivative stored"
                );
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    variant = %spec.variant,
                    bucket = %bucket,
                    base_path = %base_path,
                    "Derivative failed, skipping variant"
                );
                None
            }
        }
    }

    async fn build_artifact(
        &self,
        bucket: &str,
        base_path: &str,
        decoded: Arc<C::Image>,
        (orig_width, orig_height): (u32, u32),
        spec: &DerivativeSpec,
        cancelled: Arc<AtomicBool>,
    ) -> Result<DerivativeArtifact, DerivativeError> {
        let (width, height) =
            bounding_box_dimensions(orig_width, orig_height, spec.max_width, spec.max_height);
        let quality = spec.quality;
        let codec = Arc::clone(&self.codec);

        // A timed-out blocking task cannot be aborted; it stops before encoding
        // and the in-flight resize runs to completion.
        let encoded = tokio::task::spawn_blocking(move || {
            let resized = codec.resize(&decoded, width, height)?;
            if cancelled.load(Ordering::SeqCst) {
                return Err(DerivativeError::Cancelled);
            }
            Ok(codec.encode_jpeg(&resized, quality)?)
        })
        .await
        .map_err(|e| DerivativeError::Task(e.to_string()))??;

        let path = thumbnail_path(base_path, &spec.variant);
        let stored = self
            .committer
            .commit_bytes(bucket, &path, DERIVATIVE_CONTENT_TYPE, encoded)
            .await?;

        Ok(DerivativeArtifact {
            variant: spec.variant.clone(),
            path: stored.path,
            public_url: stored.public_url,
            size_bytes: stored.size_bytes,
        })
    }
}
