use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use upload_gallery_server::config::ServerConfig;
use upload_gallery_server::services::storage::StorageService;
use upload_gallery_server::{AppState, create_app};

const BOUNDARY: &str = "------------------------upload-test-boundary";

struct Part {
    field: &'static str,
    filename: Option<String>,
    content_type: &'static str,
    data: Vec<u8>,
}

impl Part {
    fn file(filename: &str, content_type: &'static str, data: Vec<u8>) -> Self {
        Self {
            field: "files",
            filename: Some(filename.to_string()),
            content_type,
            data,
        }
    }
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match &part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: {}\r\n\r\n",
                    part.field, filename, part.content_type
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.field
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn app_with(config: ServerConfig) -> Router {
    let storage = Arc::new(StorageService::new(config.upload_dir.clone()));
    create_app(AppState::new(config, storage))
}

fn setup_app(dir: &Path) -> Router {
    app_with(ServerConfig::with_upload_dir(dir))
}

async fn post_upload(app: Router, parts: &[Part]) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Non-JSON body with status {}: {:?}",
            status,
            String::from_utf8_lossy(&body)
        )
    });
    (status, json)
}

fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn assert_success_entries_on_disk(dir: &Path, json: &Value) {
    for entry in json["files"].as_array().unwrap() {
        let filename = entry["filename"].as_str().unwrap();
        let meta = std::fs::metadata(dir.join(filename))
            .unwrap_or_else(|_| panic!("{} missing on disk", filename));
        assert_eq!(entry["size"].as_u64().unwrap(), meta.len());
        assert_eq!(entry["path"], format!("/uploads/{}", filename));
    }
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app,
        &[Part {
            field: "note",
            filename: None,
            content_type: "text/plain",
            data: b"just a text field".to_vec(),
        }],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No files uploaded");
    assert!(stored_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_non_image_is_stored_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());
    let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    let (status, json) = post_upload(
        app,
        &[Part::file("report.bin", "application/octet-stream", content.clone())],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully processed 1 of 1 files");

    let entry = &json["files"][0];
    let filename = entry["filename"].as_str().unwrap();
    assert!(filename.ends_with("-report.bin"));
    assert_eq!(entry["mimetype"], "application/octet-stream");
    assert_eq!(
        entry["url"],
        format!("http://localhost:3030/uploads/{}", filename)
    );

    let on_disk = std::fs::read(dir.path().join(filename)).unwrap();
    assert_eq!(on_disk, content);
    assert_success_entries_on_disk(dir.path(), &json);
}

#[tokio::test]
async fn test_large_image_is_shrunk_to_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app,
        &[Part::file("big.png", "image/png", png_bytes(2400, 1600))],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_success_entries_on_disk(dir.path(), &json);

    let filename = json["files"][0]["filename"].as_str().unwrap();
    let stored = std::fs::read(dir.path().join(filename)).unwrap();
    assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);

    let (width, height) = image::load_from_memory(&stored).unwrap().dimensions();
    assert!(width <= 1920, "width {} exceeds bound", width);
    assert!(height <= 1080, "height {} exceeds bound", height);
    assert_eq!(height, 1080);
}

#[tokio::test]
async fn test_small_image_is_not_upscaled() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app,
        &[Part::file("small.png", "image/png", png_bytes(300, 150))],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let filename = json["files"][0]["filename"].as_str().unwrap();
    let stored = std::fs::read(dir.path().join(filename)).unwrap();
    assert_eq!(
        image::load_from_memory(&stored).unwrap().dimensions(),
        (300, 150)
    );
}

#[tokio::test]
async fn test_filename_is_sanitized_and_timestamped() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app,
        &[Part::file("a b?.png", "text/plain", b"pretend".to_vec())],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let filename = json["files"][0]["filename"].as_str().unwrap();

    let (token, rest) = filename.split_at(14);
    assert!(token.chars().all(|c| c.is_ascii_digit()), "{}", filename);
    assert_eq!(rest, "-a_b_.png");
    assert!(
        filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    );
}

#[tokio::test]
async fn test_per_file_failures_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app,
        &[
            Part::file("broken.jpg", "image/jpeg", b"not really a jpeg".to_vec()),
            Part::file("notes.txt", "text/plain", b"hello".to_vec()),
            Part::file("pic.png", "image/png", png_bytes(64, 64)),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully processed 2 of 3 files");

    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0]["filename"].as_str().unwrap().ends_with("-notes.txt"));
    assert!(files[1]["filename"].as_str().unwrap().ends_with("-pic.png"));
    assert_success_entries_on_disk(dir.path(), &json);
    assert_eq!(stored_files(dir.path()).len(), 2);
}

#[tokio::test]
async fn test_total_failure_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app,
        &[
            Part::file("one.png", "image/png", b"garbage".to_vec()),
            Part::file("two.gif", "image/gif", b"more garbage".to_vec()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to process any of the uploaded files");
    assert!(stored_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_too_many_files_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let parts: Vec<Part> = (0..11)
        .map(|i| Part::file(&format!("f{}.txt", i), "text/plain", b"x".to_vec()))
        .collect();
    let (status, json) = post_upload(app, &parts).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Too many files. Maximum is 10 files per request.");
    assert!(stored_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_oversized_file_rejects_whole_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::with_upload_dir(dir.path());
    config.max_file_size = 1024;
    let app = app_with(config);

    let (status, json) = post_upload(
        app,
        &[
            Part::file("fine.txt", "text/plain", vec![b'a'; 100]),
            Part::file("huge.txt", "text/plain", vec![b'b'; 2048]),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "File size too large. Maximum size is 1024 bytes per file."
    );
    assert!(stored_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_ten_files_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let parts: Vec<Part> = (0..10)
        .map(|i| Part::file(&format!("f{}.txt", i), "text/plain", b"x".to_vec()))
        .collect();
    let (status, json) = post_upload(app, &parts).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully processed 10 of 10 files");
    assert_eq!(stored_files(dir.path()).len(), 10);
    assert_success_entries_on_disk(dir.path(), &json);
}

#[tokio::test]
async fn test_file_at_size_cap_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::with_upload_dir(dir.path());
    config.max_file_size = 1024;
    let app = app_with(config);

    let (status, json) = post_upload(
        app,
        &[Part::file("exact.txt", "text/plain", vec![b'c'; 1024])],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["files"][0]["size"], 1024);
    assert_success_entries_on_disk(dir.path(), &json);
}

#[tokio::test]
async fn test_body_over_request_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::with_upload_dir(dir.path());
    config.max_files = 1;
    config.max_file_size = 1024;
    let limit = config.upload_body_limit();
    let app = app_with(config);

    // Plain fields are skipped by the handler, so only the body limit trips
    let parts: Vec<Part> = (0..11)
        .map(|_| Part {
            field: "note",
            filename: None,
            content_type: "text/plain",
            data: vec![b'n'; 1024 * 1024],
        })
        .collect();
    assert!(multipart_body(&parts).len() > limit);

    let (status, json) = post_upload(app, &parts).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "File size too large. Maximum size is 1024 bytes per file."
    );
    assert!(stored_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_file_under_unexpected_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app,
        &[Part {
            field: "avatar",
            filename: Some("me.png".to_string()),
            content_type: "image/png",
            data: png_bytes(8, 8),
        }],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unexpected field: avatar");
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"files": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_uploaded_file_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let app = setup_app(dir.path());

    let (status, json) = post_upload(
        app.clone(),
        &[Part::file("hello.txt", "text/plain", b"served back".to_vec())],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let path = json["files"][0]["path"].as_str().unwrap().to_string();

    let response = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"served back");
}

#[tokio::test]
async fn test_configured_base_url_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::with_upload_dir(dir.path());
    config.public_base_url = "https://files.example.com".to_string();
    let app = app_with(config);

    let (status, json) = post_upload(
        app,
        &[Part::file("doc.pdf", "application/pdf", b"%PDF-1.4".to_vec())],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let entry = &json["files"][0];
    assert_eq!(
        entry["url"],
        format!(
            "https://files.example.com/uploads/{}",
            entry["filename"].as_str().unwrap()
        )
    );
}
