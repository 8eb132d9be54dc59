//! The web form end to end over HTTP, with a converter that skips pdfium
//! and Google but validates uploads the same way.

use async_trait::async_trait;
use pdf2slides::pipeline::archive::ArchivePacker;
use pdf2slides::pipeline::input::SourceDocument;
use pdf2slides::pipeline::render::PageImage;
use pdf2slides::web;
use pdf2slides::{
    ConversionController, ConversionOutput, ConversionStats, Converter, Pdf2SlidesError,
    ProgressCallback, Upload,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

struct StubConverter {
    delay: Duration,
}

#[async_trait]
impl Converter for StubConverter {
    async fn convert(
        &self,
        upload: Upload,
        progress: ProgressCallback,
    ) -> Result<ConversionOutput, Pdf2SlidesError> {
        let source = SourceDocument::from_bytes(&upload.file_name, &upload.bytes)?;
        progress.on_conversion_start(2);
        tokio::time::sleep(self.delay).await;
        let mut packer = ArchivePacker::new(2);
        for index in 0..2 {
            packer.add(&PageImage {
                index,
                width: 1,
                height: 1,
                png: vec![index as u8; 8],
            })?;
            progress.on_page_complete(index + 1, 2);
        }
        progress.on_conversion_complete(2);
        let archive = if upload.save_images {
            Some(packer.finish(source.archive_name())?)
        } else {
            None
        };
        Ok(ConversionOutput {
            title: source.stem(),
            presentation_id: "web-deck".into(),
            presentation_url: "https://docs.google.com/presentation/d/web-deck".into(),
            slides: Vec::new(),
            archive,
            stats: ConversionStats::default(),
        })
    }
}

async fn spawn_ui(max_upload: usize) -> String {
    spawn_ui_with(Duration::ZERO, max_upload).await
}

async fn spawn_ui_with(delay: Duration, max_upload: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let controller = ConversionController::new(Arc::new(StubConverter { delay }));
    tokio::spawn(async move {
        web::serve(listener, controller, max_upload).await.unwrap();
    });
    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Hand-built multipart/form-data body.
fn form(file: Option<(&str, &[u8])>, save_images: bool) -> (String, Vec<u8>) {
    let boundary = "----pdf2slidesTestBoundary";
    let mut body = Vec::new();
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if save_images {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"save_images\"\r\n\r\non\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn post_form(base: &str, file: Option<(&str, &[u8])>, save_images: bool) -> reqwest::Response {
    let (content_type, body) = form(file, save_images);
    client()
        .post(format!("{base}/convert"))
        .header("content-type", content_type)
        .body(body)
        .send()
        .await
        .unwrap()
}

async fn status(base: &str) -> Value {
    client()
        .get(format!("{base}/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn idle_page_and_no_archive() {
    let base = spawn_ui(web::DEFAULT_MAX_UPLOAD_BYTES).await;

    let page = client().get(&base).send().await.unwrap();
    assert_eq!(page.status(), 200);
    let html = page.text().await.unwrap();
    assert!(html.contains("PDF to Google Slides"));
    assert!(html.contains("Also download slide images (ZIP)"));

    assert_eq!(status(&base).await["state"], "idle");
    let archive = client().get(format!("{base}/archive")).send().await.unwrap();
    assert_eq!(archive.status(), 404);
}

#[tokio::test]
async fn conversion_with_images_offers_archive_download() {
    let base = spawn_ui(web::DEFAULT_MAX_UPLOAD_BYTES).await;

    let resp = post_form(&base, Some(("Quarterly Review.pdf", b"%PDF-1.5 body")), true).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["location"], "/");

    let s = status(&base).await;
    assert_eq!(s["state"], "succeeded");
    assert_eq!(s["progress"], 1.0);
    assert_eq!(s["presentation_url"], "https://docs.google.com/presentation/d/web-deck");
    assert_eq!(s["archive_name"], "Quarterly Review_images.zip");

    let html = client().get(&base).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("https://docs.google.com/presentation/d/web-deck"));
    assert!(html.contains("href=\"/archive\""));

    let archive = client().get(format!("{base}/archive")).send().await.unwrap();
    assert_eq!(archive.status(), 200);
    assert_eq!(archive.headers()["content-type"], "application/zip");
    assert_eq!(
        archive.headers()["content-disposition"],
        "attachment; filename=\"Quarterly Review_images.zip\""
    );
    let bytes = archive.bytes().await.unwrap();
    let zip = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(zip.len(), 2);
}

#[tokio::test]
async fn unchecked_option_produces_no_archive() {
    let base = spawn_ui(web::DEFAULT_MAX_UPLOAD_BYTES).await;
    post_form(&base, Some(("a.pdf", b"%PDF-1.4")), false).await;

    let s = status(&base).await;
    assert_eq!(s["state"], "succeeded");
    assert!(s["archive_name"].is_null());
    let archive = client().get(format!("{base}/archive")).send().await.unwrap();
    assert_eq!(archive.status(), 404);
}

#[tokio::test]
async fn missing_file_shows_input_error() {
    let base = spawn_ui(web::DEFAULT_MAX_UPLOAD_BYTES).await;
    let resp = post_form(&base, None, true).await;
    assert_eq!(resp.status(), 303);

    let s = status(&base).await;
    assert_eq!(s["state"], "failed");
    assert!(s["error"].as_str().unwrap().contains("No PDF was uploaded"));

    let html = client().get(&base).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("No PDF was uploaded"));
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_with_message() {
    let base = spawn_ui(web::DEFAULT_MAX_UPLOAD_BYTES).await;
    post_form(&base, Some(("notes.txt", b"hello world")), false).await;

    let s = status(&base).await;
    assert_eq!(s["state"], "failed");
    assert!(s["error"].as_str().unwrap().contains("not a valid PDF"));
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let base = spawn_ui(1024).await;
    let big = vec![b'x'; 4096];
    let resp = post_form(&base, Some(("big.pdf", &big)), false).await;
    assert!(resp.status().is_client_error(), "{}", resp.status());
    assert_eq!(status(&base).await["state"], "idle");
}

#[tokio::test]
async fn client_disconnect_does_not_wedge_the_controller() {
    let base = spawn_ui_with(Duration::from_millis(300), web::DEFAULT_MAX_UPLOAD_BYTES).await;

    let (content_type, body) = form(Some(("a.pdf", b"%PDF-1.4")), false);
    let impatient = client()
        .post(format!("{base}/convert"))
        .timeout(Duration::from_millis(50))
        .header("content-type", content_type)
        .body(body)
        .send()
        .await;
    assert!(impatient.is_err());
    assert_eq!(status(&base).await["state"], "running");

    let mut state = Value::Null;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        state = status(&base).await;
        if state["state"] != "running" {
            break;
        }
    }
    assert_eq!(state["state"], "succeeded");

    let resp = post_form(&base, Some(("b.pdf", b"%PDF-1.4")), false).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(status(&base).await["file_name"], "b.pdf");
}

#[tokio::test]
async fn unreadable_image_option_is_a_bad_request() {
    let base = spawn_ui(web::DEFAULT_MAX_UPLOAD_BYTES).await;
    let boundary = "----pdf2slidesTestBoundary";
    // The option field is cut off before its closing boundary.
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.pdf\"\r\n\r\n\
         %PDF-1.4\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"save_images\"\r\n\r\non"
    );
    let resp = client()
        .post(format!("{base}/convert"))
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(status(&base).await["state"], "idle");
}
