use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tower::ServiceExt;
use upload_relay::config::UploadConfig;
use upload_relay::models::{ON_UPLOAD_EVENT, UPLOAD_SUCCESS_MESSAGE};
use upload_relay::{AppState, create_app};

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// Throttling disabled so every chunk reports progress.
fn unthrottled(downloads_dir: impl Into<PathBuf>) -> UploadConfig {
    UploadConfig {
        downloads_dir: downloads_dir.into(),
        message_time_delay: Duration::ZERO,
        ..UploadConfig::default()
    }
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_upload_flow() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(unthrottled(dir.path()));
    let app = create_app(state);

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 256) as u8).collect();
    let response = app
        .oneshot(upload_request(
            "/?socketId=10",
            multipart_body("video", "funny.mp4", &content),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let json = read_json(response).await;
    assert_eq!(json, serde_json::json!({ "result": UPLOAD_SUCCESS_MESSAGE }));

    let entries: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["funny.mp4".to_string()]);
    assert_eq!(std::fs::read(dir.path().join("funny.mp4")).unwrap(), content);
}

#[tokio::test]
async fn test_upload_publishes_progress_to_subscriber() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(unthrottled(dir.path()));
    let mut rx = state.notifier.subscribe();
    let app = create_app(state);

    let content = vec![7u8; 50_000];
    let response = app
        .oneshot(upload_request(
            "/?socketId=10",
            multipart_body("video", "clip.mp4", &content),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut processed = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        assert_eq!(notification.subscriber_id, "10");
        assert_eq!(notification.event_name, ON_UPLOAD_EVENT);
        assert_eq!(notification.payload.filename, "clip.mp4");
        processed.push(notification.payload.processed_already);
    }

    assert!(!processed.is_empty());
    assert!(processed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(processed.last().copied(), Some(content.len() as u64));
}

#[tokio::test]
async fn test_upload_without_socket_id_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(unthrottled(dir.path()));
    let mut rx = state.notifier.subscribe();
    let app = create_app(state);

    let response = app
        .oneshot(upload_request("/", multipart_body("file", "a.txt", b"hello")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(rx.try_recv().is_err());
    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn test_upload_strips_path_components() {
    let dir = tempfile::tempdir().unwrap();
    let downloads = dir.path().join("downloads");
    std::fs::create_dir(&downloads).unwrap();
    let app = create_app(AppState::new(unthrottled(&downloads)));

    let response = app
        .oneshot(upload_request(
            "/",
            multipart_body("file", "../escape.txt", b"nope"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(downloads.join("escape.txt").exists());
    assert!(!dir.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_write_failure_is_not_reported_as_success() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-created");
    let app = create_app(AppState::new(unthrottled(&missing)));

    let response = app
        .oneshot(upload_request("/", multipart_body("file", "a.txt", b"data")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let json = read_json(response).await;
    assert!(json.get("result").is_none());
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_missing_boundary_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(AppState::new(unthrottled(dir.path())));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "multipart/form-data")
                .body(Body::from("some file bytes"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = unthrottled(dir.path());
    config.max_upload_size = 16;
    let app = create_app(AppState::new(config));

    let response = app
        .oneshot(upload_request(
            "/",
            multipart_body("file", "big.bin", &[1u8; 4096]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!dir.path().join("big.bin").exists());
}
