//! Mediagate Storage Library
//!
//! Storage abstraction and implementations for committing uploads.
//! Every backend writes with create-if-absent semantics: an existing object is
//! never overwritten, and a write that does not complete never becomes visible
//! under its final key.
//!
//! # Key format
//!
//! Objects are addressed by `(bucket, path)`. Buckets are single segments of
//! `[a-z0-9._-]` that do not start with a dot; paths are `/`-separated and must
//! not contain empty, `.` or `..` segments, a leading `/` or backslashes.
//! Validation is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mediagate_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{PayloadReader, Storage, StorageError, StorageResult, StoredLocation};
