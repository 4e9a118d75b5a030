//! Mediagate Processing Library
//!
//! Upload validation (size, type and magic-byte gates), no-clobber commit and
//! JPEG thumbnail generation for raster images.

pub mod image;
pub mod signature;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use self::image::{CodecError, ImageCodec, ImageRsCodec};
pub use signature::SignatureTable;
pub use upload::{
    thumbnail_path, DerivativeError, DerivativeGenerator, IngestError, PayloadSource,
    StorageCommitter, UploadPipeline, UploadRequest,
};
pub use validator::{
    is_raster, normalize_mime, SignatureValidator, SizeGate, TypeAllowlist, ValidationError,
};
