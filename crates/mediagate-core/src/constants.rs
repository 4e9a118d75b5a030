//! Shared constants

/// Size units use binary megabytes.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Payloads at or above this size skip full buffering and derivative generation.
pub const DEFAULT_LARGE_FILE_THRESHOLD_MB: u64 = 100;

/// Number of leading bytes inspected for large payloads.
pub const DEFAULT_SIGNATURE_PREFIX_BYTES: usize = 1024;

pub const DEFAULT_DERIVATIVE_CONCURRENCY: usize = 2;
pub const DEFAULT_DERIVATIVE_TIMEOUT_SECS: u64 = 30;

/// Default thumbnail variants: `name:WIDTHxHEIGHT@QUALITY`.
pub const DEFAULT_THUMBNAIL_VARIANTS: &str =
    "small:200x200@80,medium:600x600@85,large:1200x1200@90";

/// Derivatives are always re-encoded as JPEG.
pub const DERIVATIVE_CONTENT_TYPE: &str = "image/jpeg";
pub const DERIVATIVE_EXTENSION: &str = "jpg";
