//! Shared key validation for storage backends.

use crate::traits::{StorageError, StorageResult};

const MAX_BUCKET_LEN: usize = 63;
const MAX_PATH_LEN: usize = 1024;

/// Validate a bucket name: one segment of `[a-z0-9._-]`, not starting with `.`.
///
/// Names starting with a dot are reserved for backend internals (e.g. staging areas).
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.len() > MAX_BUCKET_LEN {
        return Err(StorageError::InvalidKey(format!(
            "Bucket name must be 1-{} characters",
            MAX_BUCKET_LEN
        )));
    }
    if bucket.starts_with('.') || bucket.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {}",
            bucket
        )));
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'))
    {
        return Err(StorageError::InvalidKey(format!(
            "Bucket name contains invalid characters: {}",
            bucket
        )));
    }
    Ok(())
}

/// Validate an object path within a bucket.
pub fn validate_object_path(path: &str) -> StorageResult<()> {
    if path.is_empty() || path.len() > MAX_PATH_LEN {
        return Err(StorageError::InvalidKey(format!(
            "Object path must be 1-{} bytes",
            MAX_PATH_LEN
        )));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if path.chars().any(|c| c.is_control()) {
        return Err(StorageError::InvalidKey(
            "Storage key contains control characters".to_string(),
        ));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key has an empty or relative segment: {}",
            path
        )));
    }
    Ok(())
}

/// Validate both halves of an object key.
pub fn validate_key(bucket: &str, path: &str) -> StorageResult<()> {
    validate_bucket(bucket)?;
    validate_object_path(path)
}

/// Percent-encode each path segment for use in a URL, keeping `/` separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(validate_key("artworks", "2024/a.png").is_ok());
        assert!(validate_key("my-bucket.v2", "a_b-c.d/e.jpg").is_ok());
    }

    #[test]
    fn test_invalid_buckets() {
        for bucket in ["", ".staging", "a..b", "Upper", "with/slash", "sp ace"] {
            assert!(
                matches!(validate_bucket(bucket), Err(StorageError::InvalidKey(_))),
                "bucket {:?} should be rejected",
                bucket
            );
        }
    }

    #[test]
    fn test_invalid_paths() {
        for path in [
            "",
            "/etc/passwd",
            "../../etc/passwd",
            "a/../b",
            "a//b",
            "a/./b",
            "a\\b",
            "trailing/",
            "ctrl\u{0007}",
        ] {
            assert!(
                matches!(validate_object_path(path), Err(StorageError::InvalidKey(_))),
                "path {:?} should be rejected",
                path
            );
        }
    }

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("a b/c#d.png"), "a%20b/c%23d.png");
    }
}
