//! Operator-facing web UI (axum).
//!
//! | Route           | Purpose                                        |
//! |-----------------|------------------------------------------------|
//! | `GET /`         | form + last result                             |
//! | `POST /convert` | multipart upload, runs to completion, 303 → `/` |
//! | `GET /status`   | JSON [`StatusSnapshot`] for the progress bar   |
//! | `GET /archive`  | ZIP of the last run's page images              |

pub mod page;

use crate::controller::{ConversionController, StatusSnapshot};
use crate::convert::Upload;
use crate::error::Pdf2SlidesError;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Default cap on the upload body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Build the router around a controller.
pub fn router(controller: ConversionController, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert))
        .route("/status", get(status))
        .route("/archive", get(archive))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(controller)
}

/// Serve the UI on an already-bound listener until the process ends.
pub async fn serve(
    listener: TcpListener,
    controller: ConversionController,
    max_upload_bytes: usize,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Web UI listening on http://{}", addr);
    }
    axum::serve(listener, router(controller, max_upload_bytes)).await
}

async fn index(State(controller): State<ConversionController>) -> Html<String> {
    Html(page::render_page(&controller.state(), None))
}

async fn status(State(controller): State<ConversionController>) -> Json<StatusSnapshot> {
    Json(controller.snapshot())
}

async fn convert(
    State(controller): State<ConversionController>,
    multipart: Multipart,
) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(message) => {
            warn!("Rejected upload: {}", message);
            let html = page::render_page(&controller.state(), Some(&message));
            return (StatusCode::BAD_REQUEST, Html(html)).into_response();
        }
    };

    match controller.run(upload).await {
        Err(e @ Pdf2SlidesError::ConversionInProgress) => {
            let html = page::render_page(&controller.state(), Some(&e.to_string()));
            (StatusCode::CONFLICT, Html(html)).into_response()
        }
        // Success and conversion failures both live in the controller state.
        _ => Redirect::to("/").into_response(),
    }
}

/// Pull the `file` and `save_images` fields out of the form.
///
/// A missing file part becomes an empty upload so it fails the same way
/// as an empty file.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, String> {
    let mut file_name = String::new();
    let mut bytes = Vec::new();
    let mut save_images = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed upload: {e}"))?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Reading the uploaded file failed: {e}"))?
                    .to_vec();
            }
            Some("save_images") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| format!("Reading the image option failed: {e}"))?;
                save_images = matches!(value.trim(), "on" | "true" | "1" | "yes");
            }
            _ => {}
        }
    }

    if file_name.is_empty() {
        file_name = "upload.pdf".to_string();
    }
    Ok(Upload::new(file_name, bytes, save_images))
}

async fn archive(State(controller): State<ConversionController>) -> Response {
    let Some(archive) = controller.archive() else {
        return (StatusCode::NOT_FOUND, "No image archive available").into_response();
    };
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        archive.file_name.replace(['"', '\\'], "_")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"images.zip\""));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    )
        .into_response()
}
