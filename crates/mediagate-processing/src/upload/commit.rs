//! No-clobber commit of validated payloads.

use bytes::Bytes;
use mediagate_core::StoredObject;
use mediagate_storage::{PayloadReader, Storage, StorageResult, StoredLocation};
use std::sync::Arc;

/// Writes payloads through a [`Storage`] backend with create-if-absent semantics.
///
/// Conflicts come back as `StorageError::AlreadyExists` and are never retried.
#[derive(Clone)]
pub struct StorageCommitter {
    storage: Arc<dyn Storage>,
}

impl StorageCommitter {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn commit_bytes(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredObject> {
        let location = self
            .storage
            .put_if_absent(bucket, path, content_type, data)
            .await?;
        Ok(Self::stored_object(bucket, content_type, location))
    }

    pub async fn commit_stream(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        content_length: u64,
        reader: PayloadReader,
    ) -> StorageResult<StoredObject> {
        let location = self
            .storage
            .put_stream_if_absent(bucket, path, content_type, Some(content_length), reader)
            .await?;
        Ok(Self::stored_object(bucket, content_type, location))
    }

    fn stored_object(bucket: &str, content_type: &str, location: StoredLocation) -> StoredObject {
        StoredObject {
            bucket: bucket.to_string(),
            path: location.path,
            public_url: location.public_url,
            size_bytes: location.size_bytes,
            content_type: content_type.to_string(),
        }
    }
}
