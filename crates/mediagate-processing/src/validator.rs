//! Upload validation gates
//!
//! Each gate is a pure check returning `Result<(), ValidationError>`. Gates
//! hold no state between calls, so repeating a check on the same input always
//! yields the same outcome.

use mediagate_core::constants::BYTES_PER_MB;

use crate::signature::SignatureTable;

/// Accepted MIME types, normalized.
pub const ALLOWED_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/tiff",
    "image/svg+xml",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.ms-excel",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    // Design files
    "image/vnd.adobe.photoshop",
    "application/postscript",
    "application/illustrator",
];

/// Raster types the thumbnail stage can decode.
pub const RASTER_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Validation rejections. All are client-fixable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {declared} bytes (max: {max} bytes)")]
    TooLarge { declared: u64, max: u64 },

    #[error("Empty file")]
    EmptyFile,

    #[error("Unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("File content does not match declared type {mime_type}")]
    SignatureMismatch { mime_type: String },

    #[error("Declared length {declared} does not match received length {actual}")]
    LengthMismatch { declared: u64, actual: u64 },
}

impl ValidationError {
    /// Stable machine-readable rejection reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::TooLarge { .. } => "too_large",
            ValidationError::EmptyFile => "empty_file",
            ValidationError::UnsupportedType { .. } => "unsupported_type",
            ValidationError::SignatureMismatch { .. } => "signature_mismatch",
            ValidationError::LengthMismatch { .. } => "length_mismatch",
        }
    }
}

/// Normalize a declared content type: drop parameters, trim, lower-case.
///
/// `"Image/PNG; charset=binary"` becomes `"image/png"`.
pub fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Whether a normalized MIME type is eligible for thumbnails.
pub fn is_raster(mime_type: &str) -> bool {
    RASTER_TYPES.contains(&mime_type)
}

/// Rejects payloads whose declared length exceeds the caller's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeGate {
    max_bytes: u64,
}

impl SizeGate {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn from_mb(max_size_mb: u64) -> Self {
        Self::new(max_size_mb.saturating_mul(BYTES_PER_MB))
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check a declared length. A length equal to the limit is accepted.
    pub fn check(&self, declared: u64) -> Result<(), ValidationError> {
        if declared == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if declared > self.max_bytes {
            return Err(ValidationError::TooLarge {
                declared,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Fixed allow-list of accepted MIME types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeAllowlist;

impl TypeAllowlist {
    pub fn is_allowed(&self, mime_type: &str) -> bool {
        ALLOWED_TYPES.contains(&mime_type)
    }

    /// Check a normalized MIME type against the allow-list.
    pub fn check(&self, mime_type: &str) -> Result<(), ValidationError> {
        if !self.is_allowed(mime_type) {
            return Err(ValidationError::UnsupportedType {
                mime_type: mime_type.to_string(),
            });
        }
        Ok(())
    }
}

/// Confirms a declared type against the payload's leading bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureValidator {
    table: SignatureTable,
}

impl SignatureValidator {
    pub fn new(table: SignatureTable) -> Self {
        Self { table }
    }

    /// Shortest prefix that can match every registered signature.
    pub fn min_prefix_len(&self) -> usize {
        self.table.max_signature_len()
    }

    /// Types with no registered signature are accepted without inspecting `prefix`.
    pub fn check(&self, mime_type: &str, prefix: &[u8]) -> Result<(), ValidationError> {
        match self.table.matches(mime_type, prefix) {
            None => {
                tracing::debug!(
                    mime_type = %mime_type,
                    "No signature registered, skipping byte check"
                );
                Ok(())
            }
            Some(true) => Ok(()),
            Some(false) => Err(ValidationError::SignatureMismatch {
                mime_type: mime_type.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_gate_boundaries() {
        let gate = SizeGate::from_mb(2);
        assert!(gate.check(2 * 1024 * 1024).is_ok());
        assert_eq!(
            gate.check(2 * 1024 * 1024 + 1),
            Err(ValidationError::TooLarge {
                declared: 2 * 1024 * 1024 + 1,
                max: 2 * 1024 * 1024,
            })
        );
        assert_eq!(gate.check(0), Err(ValidationError::EmptyFile));
    }

    #[test]
    fn test_size_gate_is_idempotent() {
        let gate = SizeGate::from_mb(1);
        let first = gate.check(5 * 1024 * 1024).unwrap_err();
        let second = gate.check(5 * 1024 * 1024).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.reason(), "too_large");
    }

    #[test]
    fn test_allowlist() {
        let allowlist = TypeAllowlist;
        for mime in ALLOWED_TYPES {
            assert!(allowlist.check(mime).is_ok(), "{} should be allowed", mime);
        }
        let err = allowlist.check("application/x-msdownload").unwrap_err();
        assert_eq!(err.reason(), "unsupported_type");
        assert!(allowlist.check("video/mp4").is_err());
    }

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime("Image/PNG; charset=binary"), "image/png");
        assert_eq!(normalize_mime("  text/plain "), "text/plain");
        assert_eq!(normalize_mime(""), "");
    }

    #[test]
    fn test_signature_validator() {
        let validator = SignatureValidator::default();
        assert!(validator
            .check("image/png", &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0])
            .is_ok());

        let err = validator.check("image/png", b"not a real png").unwrap_err();
        assert_eq!(err.reason(), "signature_mismatch");
    }

    #[test]
    fn test_unsigned_types_always_accepted() {
        let validator = SignatureValidator::default();
        let payloads: [&[u8]; 3] = [
            b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>",
            b"\x00\x01\x02",
            b"",
        ];
        for payload in payloads {
            assert!(validator.check("image/svg+xml", payload).is_ok());
            assert!(validator.check("text/plain", payload).is_ok());
        }
    }

    #[test]
    fn test_raster_eligibility() {
        assert!(is_raster("image/jpeg"));
        assert!(is_raster("image/webp"));
        assert!(!is_raster("image/svg+xml"));
        assert!(!is_raster("image/gif"));
        assert!(!is_raster("application/pdf"));
    }
}
