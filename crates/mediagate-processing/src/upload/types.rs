//! Types for the upload pipeline.

use bytes::Bytes;
use mediagate_storage::PayloadReader;

/// Where the payload bytes come from.
pub enum PayloadSource {
    /// Already fully in memory.
    Buffered(Bytes),
    /// Read on demand; never fully buffered above the large-file threshold.
    Stream(PayloadReader),
}

impl std::fmt::Debug for PayloadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadSource::Buffered(bytes) => f
                .debug_tuple("Buffered")
                .field(&format_args!("{} bytes", bytes.len()))
                .finish(),
            PayloadSource::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// One ingest call. Created per request and consumed by the pipeline.
#[derive(Debug)]
pub struct UploadRequest {
    pub file_name: String,
    /// As declared by the caller; normalized by the pipeline.
    pub mime_type: String,
    pub declared_length: u64,
    pub source: PayloadSource,
    pub bucket: String,
    pub path: String,
    /// Caller-supplied size policy in binary megabytes.
    pub max_size_mb: u64,
}

impl UploadRequest {
    /// Request over an in-memory payload; the declared length is the buffer length.
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bucket: impl Into<String>,
        path: impl Into<String>,
        max_size_mb: u64,
        data: Bytes,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            declared_length: data.len() as u64,
            source: PayloadSource::Buffered(data),
            bucket: bucket.into(),
            path: path.into(),
            max_size_mb,
        }
    }

    /// Request over a reader whose length is known up front.
    pub fn from_reader(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bucket: impl Into<String>,
        path: impl Into<String>,
        max_size_mb: u64,
        declared_length: u64,
        reader: PayloadReader,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            declared_length,
            source: PayloadSource::Stream(reader),
            bucket: bucket.into(),
            path: path.into(),
            max_size_mb,
        }
    }
}
