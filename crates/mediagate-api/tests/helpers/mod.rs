//! Test helpers: build AppState and router over local storage in a temp dir.
//!
//! Run from workspace root: `cargo test -p mediagate-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mediagate_api::constants;
use mediagate_api::setup::routes;
use mediagate_api::state::AppState;
use mediagate_core::{
    BaseConfig, Config, IngestConfig, PipelineConfig, StorageBackend, StorageConfig,
};
use mediagate_storage::{LocalStorage, Storage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const BASE_URL: &str = "http://localhost:4000/media";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the temp dir backing its storage.
pub struct TestApp {
    pub server: TestServer,
    pub _temp_dir: TempDir,
    storage_root: PathBuf,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// On-disk location of a stored object.
    pub fn object_path(&self, bucket: &str, path: &str) -> PathBuf {
        self.storage_root.join(bucket).join(path)
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }
}

pub fn test_config(storage_path: &Path, pipeline: PipelineConfig, max_upload_mb: u64) -> Config {
    Config(Box::new(IngestConfig {
        base: BaseConfig {
            server_port: 0,
            environment: "test".to_string(),
            log_format: "pretty".to_string(),
        },
        storage: StorageConfig {
            storage_backend: Some(StorageBackend::Local),
            local_storage_path: Some(storage_path.to_string_lossy().into_owned()),
            local_storage_base_url: Some(BASE_URL.to_string()),
            s3_region: None,
            s3_endpoint: None,
            s3_public_base_url: None,
            aws_region: None,
        },
        max_upload_bytes: max_upload_mb * 1024 * 1024,
        default_max_size_mb: 50.min(max_upload_mb),
        pipeline,
    }))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(PipelineConfig::default(), 500).await
}

/// Setup a test app with a custom pipeline config and transport ceiling.
pub async fn setup_test_app_with(pipeline: PipelineConfig, max_upload_mb: u64) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let storage_root = temp_dir.path().join("objects");

    let config = test_config(&storage_root, pipeline, max_upload_mb);
    config.validate().unwrap();

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(storage_root.clone(), BASE_URL.to_string())
            .await
            .unwrap(),
    );
    let state = Arc::new(AppState::new(config.clone(), storage));
    let router = routes::setup_routes(&config, state);

    TestApp {
        server: TestServer::new(router).unwrap(),
        _temp_dir: temp_dir,
        storage_root,
    }
}

pub fn jpeg_fixture(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            ((x ^ y) % 256) as u8,
        ])
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 85))
        .unwrap();
    Bytes::from(out)
}

pub fn png_fixture(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 60, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    Bytes::from(out.into_inner())
}
