use crate::keys::{encode_path, validate_key};
use crate::traits::{PayloadReader, Storage, StorageError, StorageResult, StoredLocation};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Directory under the base path holding in-flight writes.
///
/// Bucket names cannot start with a dot, so nothing here is addressable as an object.
const STAGING_DIR: &str = ".staging";

/// Local filesystem storage implementation
///
/// Each bucket is a directory under `base_path`. Writes land in a staging file
/// first and are moved into place with a no-clobber link, so a reader never
/// sees a partial object and an existing object is never replaced.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/mediagate")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join(STAGING_DIR))
            .await
            .map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ))
            })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert a validated key to its filesystem path
    fn key_to_path(&self, bucket: &str, path: &str) -> StorageResult<PathBuf> {
        validate_key(bucket, path)?;
        Ok(self.base_path.join(bucket).join(path))
    }

    fn generate_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            encode_path(path)
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn create_staging_file(&self) -> StorageResult<NamedTempFile> {
        let staging = self.base_path.join(STAGING_DIR);
        tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("upload-")
                .suffix(".partial")
                .tempfile_in(staging)
        })
        .await
        .map_err(|e| StorageError::BackendError(format!("Staging task failed: {}", e)))?
        .map_err(|e| StorageError::UploadFailed(format!("Failed to create staging file: {}", e)))
    }

    /// Stream `reader` into a staging file and link it to `target` if nothing is there.
    ///
    /// Dropping this future before it finishes drops the staging file, which removes it.
    async fn write_no_clobber(
        &self,
        target: PathBuf,
        mut reader: PayloadReader,
    ) -> StorageResult<u64> {
        if fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(target.display().to_string()));
        }

        self.ensure_parent_dir(&target).await?;
        let staged = self.create_staging_file().await?;

        let std_file = staged.reopen().map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open staging file: {}", e))
        })?;
        let mut file = fs::File::from_std(std_file);

        let bytes_written = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream for {}: {}",
                target.display(),
                e
            ))
        })?;

        file.flush().await?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync {}: {}", target.display(), e))
        })?;
        drop(file);

        let persist_target = target.clone();
        tokio::task::spawn_blocking(move || staged.persist_noclobber(&persist_target))
            .await
            .map_err(|e| StorageError::BackendError(format!("Persist task failed: {}", e)))?
            .map_err(|e| {
                if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                    StorageError::AlreadyExists(target.display().to_string())
                } else {
                    StorageError::UploadFailed(format!(
                        "Failed to move {} into place: {}",
                        target.display(),
                        e.error
                    ))
                }
            })?;

        Ok(bytes_written)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_if_absent(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredLocation> {
        let reader: PayloadReader = Box::pin(std::io::Cursor::new(data));
        self.put_stream_if_absent(bucket, path, content_type, None, reader)
            .await
    }

    async fn put_stream_if_absent(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        _content_length: Option<u64>,
        reader: PayloadReader,
    ) -> StorageResult<StoredLocation> {
        let target = self.key_to_path(bucket, path)?;
        let start = std::time::Instant::now();

        let size_bytes = match self.write_no_clobber(target.clone(), reader).await {
            Ok(size) => size,
            Err(StorageError::AlreadyExists(_)) => {
                tracing::debug!(bucket = %bucket, key = %path, "Local storage key already exists");
                return Err(StorageError::AlreadyExists(format!("{}/{}", bucket, path)));
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %target.display(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage upload failed"
                );
                return Err(e);
            }
        };

        tracing::info!(
            path = %target.display(),
            bucket = %bucket,
            key = %path,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredLocation {
            path: path.to_string(),
            public_url: self.generate_url(bucket, path),
            size_bytes,
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> StorageResult<String> {
        validate_key(bucket, path)?;
        Ok(self.generate_url(bucket, path))
    }

    async fn exists(&self, bucket: &str, path: &str) -> StorageResult<bool> {
        let path = self.key_to_path(bucket, path)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn download(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        let file_path = self.key_to_path(bucket, path)?;

        if !fs::try_exists(&file_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, path)));
        }

        fs::read(&file_path).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                file_path.display(),
                e
            ))
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
