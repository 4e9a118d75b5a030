//! Data models shared between the pipeline and its callers

mod upload;

pub use upload::{DerivativeArtifact, PipelineResult, StoredObject};
