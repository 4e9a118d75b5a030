//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Owned async byte source handed to streaming uploads.
pub type PayloadReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Where a committed object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLocation {
    pub path: String,
    pub public_url: String,
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// Uploads are create-if-absent: when an object already exists at
/// `(bucket, path)` the call fails with [`StorageError::AlreadyExists`] and the
/// existing object is untouched. Callers must treat that as final.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload an in-memory payload unless an object already exists at the key.
    async fn put_if_absent(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredLocation>;

    /// Upload from a reader without buffering the whole payload.
    ///
    /// The reader is consumed until EOF. `content_length` is a hint only.
    async fn put_stream_if_absent(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: PayloadReader,
    ) -> StorageResult<StoredLocation>;

    /// Resolve the public URL of an object key. Does not check existence.
    fn public_url(&self, bucket: &str, path: &str) -> StorageResult<String>;

    /// Check if an object exists
    async fn exists(&self, bucket: &str, path: &str) -> StorageResult<bool>;

    /// Download an object
    async fn download(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
