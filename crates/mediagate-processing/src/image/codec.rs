//! Image codec abstraction
//!
//! The derivative stage only needs decode, resize and JPEG encode. Keeping
//! those behind [`ImageCodec`] lets the pipeline run against any image library.
//! All methods are blocking and are called from `spawn_blocking`.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

use super::resize::select_filter;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to resize image: {0}")]
    Resize(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Decode/resize/encode capability.
pub trait ImageCodec: Send + Sync + 'static {
    /// Decoded in-memory image, shared read-only across derivatives.
    type Image: Send + Sync + 'static;

    fn decode(&self, data: &[u8]) -> Result<Self::Image, CodecError>;

    fn dimensions(&self, image: &Self::Image) -> (u32, u32);

    /// Resize to exactly `width` x `height`.
    fn resize(&self, image: &Self::Image, width: u32, height: u32)
        -> Result<Self::Image, CodecError>;

    /// Encode as baseline JPEG at `quality` (1-100).
    fn encode_jpeg(&self, image: &Self::Image, quality: u8) -> Result<Bytes, CodecError>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRsCodec;

impl ImageCodec for ImageRsCodec {
    type Image = DynamicImage;

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
        image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn dimensions(&self, image: &DynamicImage) -> (u32, u32) {
        image.dimensions()
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::Resize(format!(
                "Invalid target dimensions {}x{}",
                width, height
            )));
        }
        let (orig_width, orig_height) = image.dimensions();
        let filter = select_filter(orig_width, orig_height, width, height);
        Ok(image.resize_exact(width, height, filter))
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Bytes, CodecError> {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let (width, height) = rgb.dimensions();
        let mut buffer = Vec::with_capacity((width as usize * height as usize) / 4);
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|e| CodecError::Encode(e.to_string()))?;

        Ok(Bytes::from(buffer))
    }
}
