//! Mediagate Core Library
//!
//! This crate provides the configuration, error types and shared models used by
//! the storage, processing and API crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, DerivativeSpec, IngestConfig, PipelineConfig, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{DerivativeArtifact, PipelineResult, StoredObject};
pub use storage_types::StorageBackend;
