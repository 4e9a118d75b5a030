//! Image processing module
//!
//! - Codec abstraction over decode/resize/encode (codec)
//! - Bounding-box dimension math and filter selection (resize)

pub mod codec;
pub mod resize;

pub use codec::{CodecError, ImageCodec, ImageRsCodec};
pub use resize::{bounding_box_dimensions, select_filter};
