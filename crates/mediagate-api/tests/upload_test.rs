//! Upload API integration tests.
//!
//! Run with: `cargo test -p mediagate-api --test upload_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use helpers::{api_path, jpeg_fixture, png_fixture, setup_test_app, setup_test_app_with};
use image::GenericImageView;
use mediagate_core::PipelineConfig;
use serde_json::Value;

fn upload_form(bucket: &str, file_path: &str, data: Bytes, file_name: &str, mime: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("bucket", bucket.to_string())
        .add_text("filePath", file_path.to_string())
        .add_part(
            "file",
            Part::bytes(data).file_name(file_name.to_string()).mime_type(mime.to_string()),
        )
}

fn padded(header: &[u8], total: usize) -> Bytes {
    let mut data = header.to_vec();
    data.resize(total, 0);
    Bytes::from(data)
}

#[tokio::test]
async fn test_upload_jpeg_returns_thumbnails() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(
        "photos",
        "2024/cat.jpg",
        jpeg_fixture(1200, 800),
        "cat.jpg",
        "image/jpeg",
    );
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], "2024/cat.jpg");
    assert_eq!(body["fileName"], "cat.jpg");
    assert_eq!(body["mimeType"], "image/jpeg");
    assert_eq!(body["publicUrl"], format!("{}/photos/2024/cat.jpg", helpers::BASE_URL));

    let thumbnails = body["thumbnails"].as_array().unwrap();
    let variants: Vec<&str> = thumbnails
        .iter()
        .map(|t| t["variant"].as_str().unwrap())
        .collect();
    assert_eq!(variants, vec!["small", "medium", "large"]);
    assert_eq!(thumbnails[0]["path"], "2024/cat_thumb_small.jpg");
    assert!(thumbnails[0]["size"].as_u64().unwrap() > 0);

    let small = std::fs::read(app.object_path("photos", "2024/cat_thumb_small.jpg")).unwrap();
    assert_eq!(image::load_from_memory(&small).unwrap().dimensions(), (200, 133));

    let original = std::fs::read(app.object_path("photos", "2024/cat.jpg")).unwrap();
    assert_eq!(body["fileSize"].as_u64().unwrap(), original.len() as u64);
}

#[tokio::test]
async fn test_upload_png_without_file_name_uses_path_segment() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = MultipartForm::new()
        .add_text("bucket", "art")
        .add_text("filePath", "tall/poster.png")
        .add_part("file", Part::bytes(png_fixture(300, 600)).mime_type("image/png"));
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["fileName"], "poster.png");
    assert_eq!(body["thumbnails"][0]["variant"], "small");
    assert_eq!(body["thumbnails"][0]["path"], "tall/poster_thumb_small.jpg");
}

#[tokio::test]
async fn test_fake_png_rejected_with_422() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(
        "photos",
        "fake.png",
        Bytes::from_static(b"definitely not a png"),
        "fake.png",
        "image/png",
    );
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert_eq!(body["code"], "SIGNATURE_MISMATCH");
    assert!(!app.object_path("photos", "fake.png").exists());
}

#[tokio::test]
async fn test_unsupported_type_rejected_with_415() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(
        "files",
        "setup.exe",
        Bytes::from_static(b"MZ\x90\x00"),
        "setup.exe",
        "application/x-msdownload",
    );
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 415);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_TYPE");
}

#[tokio::test]
async fn test_file_over_max_size_rejected_with_413() {
    let app = setup_test_app().await;
    let client = app.client();

    let data = padded(b"%PDF-1.7\n", 2 * 1024 * 1024);
    let form = upload_form("docs", "big.pdf", data, "big.pdf", "application/pdf")
        .add_text("maxSizeMB", "1");
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(!app.object_path("docs", "big.pdf").exists());
}

#[tokio::test]
async fn test_max_size_before_file_cuts_off_early() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = MultipartForm::new()
        .add_text("maxSizeMB", "1")
        .add_text("bucket", "docs")
        .add_text("filePath", "big.pdf")
        .add_part(
            "file",
            Part::bytes(padded(b"%PDF-1.7\n", 2 * 1024 * 1024))
                .file_name("big.pdf")
                .mime_type("application/pdf"),
        );
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 413);
    assert!(!app.object_path("docs", "big.pdf").exists());
}

#[tokio::test]
async fn test_body_over_transport_ceiling_rejected() {
    let app = setup_test_app_with(PipelineConfig::default(), 1).await;
    let client = app.client();

    let data = padded(b"%PDF-1.7\n", 3 * 1024 * 1024);
    let form = upload_form("docs", "huge.pdf", data, "huge.pdf", "application/pdf");
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 413);
    assert!(!app.object_path("docs", "huge.pdf").exists());
}

#[tokio::test]
async fn test_large_upload_streams_without_thumbnails() {
    let pipeline = PipelineConfig {
        large_file_threshold_bytes: 64 * 1024,
        ..PipelineConfig::default()
    };
    let app = setup_test_app_with(pipeline, 500).await;
    let client = app.client();

    let data = padded(&[0xFF, 0xD8, 0xFF, 0xE0], 256 * 1024);
    let form = upload_form("photos", "raw/huge.jpg", data, "huge.jpg", "image/jpeg");
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["fileSize"].as_u64().unwrap(), 256 * 1024);
    assert!(body["thumbnails"].as_array().unwrap().is_empty());

    let stored = std::fs::metadata(app.object_path("photos", "raw/huge.jpg")).unwrap();
    assert_eq!(stored.len(), 256 * 1024);
    assert!(!app.object_path("photos", "raw/huge_thumb_small.jpg").exists());
}

#[tokio::test]
async fn test_large_upload_with_bad_prefix_rejected() {
    let pipeline = PipelineConfig {
        large_file_threshold_bytes: 64 * 1024,
        ..PipelineConfig::default()
    };
    let app = setup_test_app_with(pipeline, 500).await;
    let client = app.client();

    let data = padded(b"not a jpeg", 256 * 1024);
    let form = upload_form("photos", "raw/bad.jpg", data, "bad.jpg", "image/jpeg");
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 422);
    assert!(!app.object_path("photos", "raw/bad.jpg").exists());
}

#[tokio::test]
async fn test_existing_path_returns_409_and_keeps_original() {
    let app = setup_test_app().await;
    let client = app.client();

    let first = upload_form(
        "docs",
        "report.pdf",
        Bytes::from_static(b"%PDF-1.4 first"),
        "report.pdf",
        "application/pdf",
    );
    let response = client.post(&api_path("/uploads")).multipart(first).await;
    assert_eq!(response.status_code(), 200);

    let second = upload_form(
        "docs",
        "report.pdf",
        Bytes::from_static(b"%PDF-1.4 second"),
        "report.pdf",
        "application/pdf",
    );
    let response = client.post(&api_path("/uploads")).multipart(second).await;

    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT");

    let stored = std::fs::read(app.object_path("docs", "report.pdf")).unwrap();
    assert_eq!(stored, b"%PDF-1.4 first");
}

#[tokio::test]
async fn test_svg_accepted_without_signature() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(
        "icons",
        "logo.svg",
        Bytes::from_static(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
        "logo.svg",
        "image/svg+xml",
    );
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["thumbnails"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_file_field_returns_400() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = MultipartForm::new()
        .add_text("bucket", "photos")
        .add_text("filePath", "cat.jpg");
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_missing_bucket_returns_400() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = MultipartForm::new()
        .add_text("filePath", "cat.jpg")
        .add_part(
            "file",
            Part::bytes(jpeg_fixture(10, 10))
                .file_name("cat.jpg")
                .mime_type("image/jpeg"),
        );
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_invalid_max_size_returns_400() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(
        "docs",
        "a.pdf",
        Bytes::from_static(b"%PDF-1.4"),
        "a.pdf",
        "application/pdf",
    )
    .add_text("maxSizeMB", "lots");
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_path_traversal_returns_400() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(
        "docs",
        "../escape.pdf",
        Bytes::from_static(b"%PDF-1.4"),
        "escape.pdf",
        "application/pdf",
    );
    let response = client.post(&api_path("/uploads")).multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert!(!app.storage_root().join("escape.pdf").exists());
}

#[tokio::test]
async fn test_non_multipart_body_returns_400() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post(&api_path("/uploads"))
        .json(&serde_json::json!({ "bucket": "photos" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "healthy");
}

#[tokio::test]
async fn test_openapi_document() {
    let app = setup_test_app().await;

    let response = app.client().get("/api-docs/openapi.json").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/api/v0/uploads"]["post"].is_object());
    assert!(body["components"]["schemas"]["UploadResponse"].is_object());
}
