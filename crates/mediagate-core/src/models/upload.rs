use serde::{Deserialize, Serialize};

/// Primary asset committed to the object store.
///
/// Immutable once created; the store owns the object and this value only
/// references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
    pub size_bytes: u64,
    pub content_type: String,
}

/// A resized, re-encoded copy of the primary image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeArtifact {
    pub variant: String,
    pub path: String,
    pub public_url: String,
    pub size_bytes: u64,
}

/// Everything the pipeline hands back to its caller.
///
/// `thumbnails` follows configured variant order and may be shorter than the
/// configured variant list when individual derivatives failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    pub file_name: String,
    pub stored: StoredObject,
    pub thumbnails: Vec<DerivativeArtifact>,
}

impl PipelineResult {
    pub fn stored(
        file_name: String,
        stored: StoredObject,
        thumbnails: Vec<DerivativeArtifact>,
    ) -> Self {
        Self {
            success: true,
            file_name,
            stored,
            thumbnails,
        }
    }
}
