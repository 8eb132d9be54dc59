//! Drive + Slides clients and the page loop against an in-process mock of
//! the Google REST endpoints.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use pdf2slides::google::{AssetStore, DriveClient, PresentationService, SlidesClient};
use pdf2slides::pipeline::render::{PageImage, RenderedPages};
use pdf2slides::{
    run_pipeline, ApiEndpoints, AssetRetention, ConversionConfig, ErrorKind, NoopProgressCallback,
    Pdf2SlidesError,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const TOKEN: &str = "test-access-token";

// ── Mock Google ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorded {
    /// (uploaded name, media bytes) in upload order.
    uploads: Vec<(String, usize)>,
    permissions: Vec<(String, Value)>,
    revoked: Vec<(String, String)>,
    deleted: Vec<String>,
    titles: Vec<String>,
    batches: Vec<(String, Value)>,
    bad_auth: usize,
}

#[derive(Clone, Default)]
struct MockGoogle {
    rec: Arc<Mutex<Recorded>>,
    /// 1-based upload attempt that answers 500.
    fail_upload_at: Option<usize>,
    /// Make presentations.create answer 403.
    deny_create: bool,
}

impl MockGoogle {
    fn check_auth(&self, headers: &HeaderMap) {
        let expected = format!("Bearer {TOKEN}");
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(&expected) {
            self.rec.lock().unwrap().bad_auth += 1;
        }
    }
}

fn google_error(status: StatusCode, message: &str, code: &str) -> Response {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message, "status": code}})),
    )
        .into_response()
}

/// Pull the JSON metadata part out of a multipart/related body.
fn metadata_part(body: &[u8]) -> Value {
    let text = String::from_utf8_lossy(body);
    let start = text.find('{').unwrap();
    let end = start + text[start..].find("}\r\n").unwrap() + 1;
    serde_json::from_str(&text[start..end]).unwrap()
}

async fn upload(
    State(mock): State<MockGoogle>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    mock.check_auth(&headers);
    assert_eq!(q.get("uploadType").map(String::as_str), Some("multipart"));
    let content_type = headers["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("multipart/related; boundary="));

    let meta = metadata_part(&body);
    let mut rec = mock.rec.lock().unwrap();
    rec.uploads.push((
        meta["name"].as_str().unwrap().to_string(),
        body.len(),
    ));
    let attempt = rec.uploads.len();
    if mock.fail_upload_at == Some(attempt) {
        return google_error(StatusCode::INTERNAL_SERVER_ERROR, "Backend Error", "INTERNAL");
    }
    assert_eq!(meta["mimeType"], "image/png");
    Json(json!({"id": format!("file{attempt}")})).into_response()
}

async fn share(
    State(mock): State<MockGoogle>,
    headers: HeaderMap,
    Path(file_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    mock.check_auth(&headers);
    mock.rec
        .lock()
        .unwrap()
        .permissions
        .push((file_id.clone(), body));
    Json(json!({"id": format!("perm-{file_id}")}))
}

async fn unshare(
    State(mock): State<MockGoogle>,
    headers: HeaderMap,
    Path((file_id, permission_id)): Path<(String, String)>,
) -> StatusCode {
    mock.check_auth(&headers);
    mock.rec
        .lock()
        .unwrap()
        .revoked
        .push((file_id, permission_id));
    StatusCode::NO_CONTENT
}

async fn delete_file(
    State(mock): State<MockGoogle>,
    headers: HeaderMap,
    Path(file_id): Path<String>,
) -> StatusCode {
    mock.check_auth(&headers);
    mock.rec.lock().unwrap().deleted.push(file_id);
    StatusCode::NO_CONTENT
}

async fn create_presentation(
    State(mock): State<MockGoogle>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.check_auth(&headers);
    if mock.deny_create {
        return google_error(
            StatusCode::FORBIDDEN,
            "Google Slides API has not been used in project 123",
            "PERMISSION_DENIED",
        );
    }
    mock.rec
        .lock()
        .unwrap()
        .titles
        .push(body["title"].as_str().unwrap_or_default().to_string());
    Json(json!({
        "presentationId": "deck1",
        "title": body["title"],
        "slides": [{"objectId": "p"}]
    }))
    .into_response()
}

async fn batch_update(
    State(mock): State<MockGoogle>,
    headers: HeaderMap,
    Path(call): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    mock.check_auth(&headers);
    let id = call.strip_suffix(":batchUpdate").unwrap().to_string();
    let replies = vec![json!({}); body["requests"].as_array().map_or(0, Vec::len)];
    mock.rec.lock().unwrap().batches.push((id.clone(), body));
    Json(json!({"presentationId": id, "replies": replies}))
}

async fn spawn(mock: MockGoogle) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/upload/drive/v3/files", post(upload))
        .route("/drive/v3/files/:id/permissions", post(share))
        .route("/drive/v3/files/:id/permissions/:pid", delete(unshare))
        .route("/drive/v3/files/:id", delete(delete_file))
        .route("/v1/presentations", post(create_presentation))
        .route("/v1/presentations/:call", post(batch_update))
        .with_state(mock);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn clients(base: &str) -> (DriveClient, SlidesClient) {
    let endpoints = ApiEndpoints::with_base(base);
    let http = reqwest::Client::new();
    (
        DriveClient::new(http.clone(), TOKEN, endpoints.drive_upload, endpoints.drive),
        SlidesClient::new(http, TOKEN, endpoints.slides),
    )
}

fn pages(n: usize) -> RenderedPages {
    RenderedPages::from_images(
        (0..n)
            .map(|index| PageImage {
                index,
                width: 1440,
                height: 810,
                png: vec![index as u8; 100 + index],
            })
            .collect(),
    )
}

fn config(retention: AssetRetention) -> ConversionConfig {
    ConversionConfig::builder()
        .retention(retention)
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn drive_upload_creates_file_and_public_grant() {
    let mock = MockGoogle::default();
    let base = spawn(mock.clone()).await;
    let (drive, _) = clients(&base);

    let asset = drive.upload("slide_001.png", b"\x89PNG...").await.unwrap();

    assert_eq!(asset.file_id, "file1");
    assert_eq!(asset.permission_id.as_deref(), Some("perm-file1"));
    assert_eq!(asset.url, "https://drive.google.com/uc?id=file1&export=download");

    let rec = mock.rec.lock().unwrap();
    assert_eq!(rec.uploads[0].0, "slide_001.png");
    assert_eq!(
        rec.permissions,
        vec![("file1".to_string(), json!({"type": "anyone", "role": "reader"}))]
    );
    assert_eq!(rec.bad_auth, 0);
}

#[tokio::test]
async fn three_pages_become_three_ordered_slides() {
    let mock = MockGoogle::default();
    let base = spawn(mock.clone()).await;
    let (drive, slides) = clients(&base);

    let output = run_pipeline(
        pages(3),
        "lecture",
        Some("lecture_images.zip"),
        &drive,
        &slides,
        &config(AssetRetention::Keep),
        Arc::new(NoopProgressCallback),
    )
    .await
    .unwrap();

    assert_eq!(output.presentation_id, "deck1");
    assert_eq!(
        output.presentation_url,
        "https://docs.google.com/presentation/d/deck1"
    );
    let slide_ids: Vec<&str> = output.slides.iter().map(|s| s.slide_id.as_str()).collect();
    assert_eq!(slide_ids, vec!["slide_page_0", "slide_page_1", "slide_page_2"]);

    let archive = output.archive.as_ref().unwrap();
    assert_eq!(archive.file_name, "lecture_images.zip");
    assert_eq!(archive.entries, 3);

    let rec = mock.rec.lock().unwrap();
    assert_eq!(rec.titles, vec!["lecture"]);
    let names: Vec<&str> = rec.uploads.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["slide_001.png", "slide_002.png", "slide_003.png"]);
    assert_eq!(rec.bad_auth, 0);

    // Exactly one commit: 2 requests per page, then the default-slide delete.
    assert_eq!(rec.batches.len(), 1);
    let (deck, body) = &rec.batches[0];
    assert_eq!(deck, "deck1");
    let requests = body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 7);
    for (i, pair) in requests[..6].chunks(2).enumerate() {
        let slide_id = format!("slide_page_{i}");
        assert_eq!(pair[0]["createSlide"]["objectId"], slide_id.as_str());
        assert_eq!(
            pair[0]["createSlide"]["slideLayoutReference"]["predefinedLayout"],
            "BLANK"
        );
        let image = &pair[1]["createImage"];
        assert_eq!(
            image["url"],
            format!("https://drive.google.com/uc?id=file{}&export=download", i + 1).as_str()
        );
        let props = &image["elementProperties"];
        assert_eq!(props["pageObjectId"], slide_id.as_str());
        assert_eq!(props["size"]["width"]["magnitude"], 720.0);
        assert_eq!(props["size"]["height"]["magnitude"], 405.0);
        assert_eq!(props["size"]["width"]["unit"], "PT");
        assert_eq!(props["transform"]["scaleX"], 1.0);
        assert_eq!(props["transform"]["translateX"], 0.0);
    }
    assert_eq!(requests[6], json!({"deleteObject": {"objectId": "p"}}));

    // Keep leaves every file and grant alone.
    assert!(rec.revoked.is_empty() && rec.deleted.is_empty());
}

#[tokio::test]
async fn zero_pages_only_delete_the_default_slide() {
    let mock = MockGoogle::default();
    let base = spawn(mock.clone()).await;
    let (drive, slides) = clients(&base);

    let output = run_pipeline(
        pages(0),
        "blank",
        Some("blank_images.zip"),
        &drive,
        &slides,
        &config(AssetRetention::Keep),
        Arc::new(NoopProgressCallback),
    )
    .await
    .unwrap();

    assert!(output.slides.is_empty());
    assert_eq!(output.archive.map(|a| a.entries), Some(0));
    let rec = mock.rec.lock().unwrap();
    assert!(rec.uploads.is_empty());
    assert_eq!(
        rec.batches[0].1,
        json!({"requests": [{"deleteObject": {"objectId": "p"}}]})
    );
}

#[tokio::test]
async fn upload_failure_at_page_two_stops_before_commit() {
    let mock = MockGoogle {
        fail_upload_at: Some(2),
        ..Default::default()
    };
    let base = spawn(mock.clone()).await;
    let (drive, slides) = clients(&base);

    let err = run_pipeline(
        pages(4),
        "deck",
        None,
        &drive,
        &slides,
        &config(AssetRetention::Delete),
        Arc::new(NoopProgressCallback),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, Pdf2SlidesError::Api { status: 500, .. }),
        "{err}"
    );
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("Backend Error"));

    let rec = mock.rec.lock().unwrap();
    assert_eq!(rec.uploads.len(), 2);
    // Page 1 stays uploaded and shared; nothing is committed or cleaned up.
    assert_eq!(rec.permissions.len(), 1);
    assert!(rec.batches.is_empty());
    assert!(rec.deleted.is_empty());
}

#[tokio::test]
async fn retention_policies_clean_up_after_commit() {
    for (retention, expect_revoked, expect_deleted) in [
        (AssetRetention::RevokePublic, 2, 0),
        (AssetRetention::Delete, 0, 2),
    ] {
        let mock = MockGoogle::default();
        let base = spawn(mock.clone()).await;
        let (drive, slides) = clients(&base);

        run_pipeline(
            pages(2),
            "deck",
            None,
            &drive,
            &slides,
            &config(retention),
            Arc::new(NoopProgressCallback),
        )
        .await
        .unwrap();

        let rec = mock.rec.lock().unwrap();
        assert_eq!(rec.batches.len(), 1);
        assert_eq!(rec.revoked.len(), expect_revoked, "{retention:?}");
        assert_eq!(rec.deleted.len(), expect_deleted, "{retention:?}");
        if expect_revoked > 0 {
            assert_eq!(rec.revoked[0], ("file1".to_string(), "perm-file1".to_string()));
        }
        if expect_deleted > 0 {
            assert_eq!(rec.deleted, vec!["file1", "file2"]);
        }
    }
}

#[tokio::test]
async fn presentation_create_error_carries_google_message() {
    let mock = MockGoogle {
        deny_create: true,
        ..Default::default()
    };
    let base = spawn(mock).await;
    let (_, slides) = clients(&base);

    let err = slides.create("deck").await.unwrap_err();
    match &err {
        Pdf2SlidesError::Api {
            status, message, ..
        } => {
            assert_eq!(*status, 403);
            assert!(message.contains("has not been used"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Port 9 (discard) is not listening in test environments.
    let (drive, _) = clients("http://127.0.0.1:9");
    let err = drive.upload("slide_001.png", b"png").await.unwrap_err();
    assert!(matches!(err, Pdf2SlidesError::Http { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Transport);
}
