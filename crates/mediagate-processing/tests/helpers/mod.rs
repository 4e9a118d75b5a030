#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use mediagate_processing::{CodecError, ImageCodec, ImageRsCodec};
use mediagate_storage::{
    PayloadReader, Storage, StorageBackend, StorageError, StorageResult, StoredLocation,
};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Bytes kept per streamed object; the rest is only counted.
const STREAM_HEAD_BYTES: usize = 64;

#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub content_type: String,
    pub size_bytes: u64,
    /// Full body for buffered writes, leading bytes for streamed ones.
    pub body: Bytes,
}

/// In-memory no-clobber store that counts every successful write.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, StoredEntry>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredEntry> {
        self.objects
            .lock()
            .unwrap()
            .get(&Self::key(bucket, path))
            .cloned()
    }

    fn key(bucket: &str, path: &str) -> String {
        format!("{}/{}", bucket, path)
    }

    fn insert(&self, bucket: &str, path: &str, entry: StoredEntry) -> StorageResult<StoredLocation> {
        mediagate_storage::keys::validate_key(bucket, path)?;
        let key = Self::key(bucket, path);
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(StorageError::AlreadyExists(key));
        }
        let size_bytes = entry.size_bytes;
        objects.insert(key, entry);
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(StoredLocation {
            path: path.to_string(),
            public_url: format!("memory://{}/{}", bucket, path),
            size_bytes,
        })
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put_if_absent(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<StoredLocation> {
        self.insert(
            bucket,
            path,
            StoredEntry {
                content_type: content_type.to_string(),
                size_bytes: data.len() as u64,
                body: data,
            },
        )
    }

    async fn put_stream_if_absent(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        _content_length: Option<u64>,
        mut reader: PayloadReader,
    ) -> StorageResult<StoredLocation> {
        if self.objects.lock().unwrap().contains_key(&Self::key(bucket, path)) {
            return Err(StorageError::AlreadyExists(Self::key(bucket, path)));
        }

        let mut head = Vec::new();
        let mut total = 0u64;
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
            if n == 0 {
                break;
            }
            if head.len() < STREAM_HEAD_BYTES {
                let take = (STREAM_HEAD_BYTES - head.len()).min(n);
                head.extend_from_slice(&buf[..take]);
            }
            total += n as u64;
        }

        self.insert(
            bucket,
            path,
            StoredEntry {
                content_type: content_type.to_string(),
                size_bytes: total,
                body: Bytes::from(head),
            },
        )
    }

    fn public_url(&self, bucket: &str, path: &str) -> StorageResult<String> {
        Ok(format!("memory://{}/{}", bucket, path))
    }

    async fn exists(&self, bucket: &str, path: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(&Self::key(bucket, path)))
    }

    async fn download(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        self.get(bucket, path)
            .map(|entry| entry.body.to_vec())
            .ok_or_else(|| StorageError::NotFound(Self::key(bucket, path)))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Codec whose JPEG encode fails for images of one width.
pub struct FailingEncodeCodec {
    pub fail_width: u32,
}

impl ImageCodec for FailingEncodeCodec {
    type Image = DynamicImage;

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
        ImageRsCodec.decode(data)
    }

    fn dimensions(&self, image: &DynamicImage) -> (u32, u32) {
        image.dimensions()
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, CodecError> {
        ImageRsCodec.resize(image, width, height)
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Bytes, CodecError> {
        if image.width() == self.fail_width {
            return Err(CodecError::Encode("forced failure".to_string()));
        }
        ImageRsCodec.encode_jpeg(image, quality)
    }
}

/// Codec whose resize blocks for `delay` on one target width and which
/// records the width of every image it encodes.
pub struct SlowResizeCodec {
    pub slow_width: u32,
    pub delay: Duration,
    pub encoded_widths: Arc<Mutex<Vec<u32>>>,
}

impl ImageCodec for SlowResizeCodec {
    type Image = DynamicImage;

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
        ImageRsCodec.decode(data)
    }

    fn dimensions(&self, image: &DynamicImage) -> (u32, u32) {
        image.dimensions()
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, CodecError> {
        if width == self.slow_width {
            std::thread::sleep(self.delay);
        }
        ImageRsCodec.resize(image, width, height)
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Bytes, CodecError> {
        self.encoded_widths.lock().unwrap().push(image.width());
        ImageRsCodec.encode_jpeg(image, quality)
    }
}

/// Noisy gradient so the encoded JPEG is not trivially small.
pub fn jpeg_fixture(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let noise = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) % 64;
        Rgb([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            noise as u8 * 4,
        ])
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 85))
        .unwrap();
    Bytes::from(out)
}

pub fn png_fixture(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    Bytes::from(out.into_inner())
}

/// Reader that fails the test if it is ever polled.
pub struct UntouchableReader;

impl tokio::io::AsyncRead for UntouchableReader {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        _buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        panic!("payload must not be read");
    }
}
