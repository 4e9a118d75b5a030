/// Prefix for versioned routes.
pub const API_PREFIX: &str = "/api/v0";

/// Allowance on top of the upload ceiling for multipart framing and text fields.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Maximum concurrent requests when `HTTP_CONCURRENCY_LIMIT` is unset.
pub const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 1000;
